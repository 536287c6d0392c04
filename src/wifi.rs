use std::net::Ipv4Addr;

use anyhow::Result;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
use log::info;

use crate::connection::Link;
use crate::error::LinkError;

/// Station-mode Wi-Fi. `begin` only issues the request; association is
/// observed through `is_associated` and the DHCP lease through `local_ip`.
pub struct EspLink {
    wifi: Box<EspWifi<'static>>,
    started: bool,
}

/// Log AP state from ESP-IDF internals.
fn log_wifi_diag(label: &str) {
    unsafe {
        let mut ap_info: esp_idf_sys::wifi_ap_record_t = core::mem::zeroed();
        let ap_rc = esp_idf_sys::esp_wifi_sta_get_ap_info(&mut ap_info);
        if ap_rc == esp_idf_sys::ESP_OK {
            let ssid = core::str::from_utf8(&ap_info.ssid)
                .unwrap_or("?")
                .trim_end_matches('\0');
            info!(
                "WiFi [{}]: assoc=YES rssi={} ch={} ssid={}",
                label, ap_info.rssi, ap_info.primary, ssid
            );
        } else {
            info!("WiFi [{}]: assoc=NO (ap_info err={})", label, ap_rc);
        }
    }
}

fn driver(e: impl std::fmt::Display) -> LinkError {
    LinkError::Driver(e.to_string())
}

impl EspLink {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self> {
        let wifi = EspWifi::new(modem, sysloop, nvs)?;
        Ok(Self {
            wifi: Box::new(wifi),
            started: false,
        })
    }
}

impl Link for EspLink {
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        let auth = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let mut wifi_ssid = heapless::String::<32>::new();
        let mut wifi_pass = heapless::String::<64>::new();
        wifi_ssid
            .push_str(ssid)
            .map_err(|_| LinkError::Driver(format!("SSID longer than 32 bytes: {:?}", ssid)))?;
        wifi_pass
            .push_str(password)
            .map_err(|_| LinkError::Driver("password longer than 64 bytes".to_string()))?;

        if self.started {
            // Drop any half-finished attempt before asking again.
            let _ = self.wifi.disconnect();
            if crate::debug_flags::verbose() {
                log_wifi_diag("rejoin");
            }
        }

        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: wifi_ssid,
                password: wifi_pass,
                auth_method: auth,
                ..Default::default()
            }))
            .map_err(driver)?;

        if !self.started {
            self.wifi.start().map_err(driver)?;
            self.started = true;
        }
        self.wifi.connect().map_err(driver)
    }

    fn is_associated(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        if !self.wifi.is_up().unwrap_or(false) {
            return None;
        }
        let ip_info = self.wifi.sta_netif().get_ip_info().ok()?;
        if ip_info.ip.is_unspecified() {
            None
        } else {
            Some(ip_info.ip)
        }
    }
}
