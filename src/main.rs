#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs};
    use homelab_status_display::{
        config::{self, Config},
        connection::ConnectionManager,
        debug_flags,
        fetcher::StatusFetcher,
        http_client::EspHttpTransport,
        panel::{Panel, PanelPins},
        poll::PollLoop,
        time_sync::EspTimeSource,
        wifi::EspLink,
    };
    use log::{info, warn};

    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("BOOT homelab status display v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 1. Config: compiled defaults, then NVS overrides ──
    let cfg = match EspNvs::new(nvs_partition.clone(), config::NS, true) {
        Ok(nvs) => Config::compiled().with_nvs_overrides(&nvs),
        Err(e) => {
            warn!("NVS namespace '{}' unavailable ({}), using compiled config", config::NS, e);
            Config::compiled()
        }
    };
    debug_flags::set(&debug_flags::DEBUG_STATUS, cfg.debug);
    if cfg.debug {
        cfg.log_summary();
        info!("debug: {}", debug_flags::status_line());
    }

    // ── 2. Display ──
    let pins = peripherals.pins;
    let panel = Panel::new(
        peripherals.spi2,
        PanelPins {
            sclk: pins.gpio14.into(),
            mosi: pins.gpio13.into(),
            miso: pins.gpio12.into(),
            cs: pins.gpio15.into(),
            dc: pins.gpio2.into(),
            backlight: pins.gpio21.into(),
        },
    )?;

    // ── 3. Network + status source ──
    let link = EspLink::new(peripherals.modem, sysloop, Some(nvs_partition))?;
    let fetcher = StatusFetcher::new(EspHttpTransport::new(), cfg.status_url());

    // ── 4. Main loop (never returns) ──
    let poll = PollLoop::new(ConnectionManager::new(link), fetcher, panel, &cfg);
    let mut time = EspTimeSource::new();
    if debug_flags::verbose() {
        info!("Entering main loop");
    }
    poll.run(&mut time)
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "homelab-status-display runs on ESP-IDF targets; on the host only `cargo test` is useful."
    );
}
