use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::clock::{self, ServerTime};
use crate::config::{Config, NTP_SERVER};
use crate::connection::{self, ConnectionManager, Link, TimeSource};
use crate::dashboard::{self, Dashboard, RenderContext};
use crate::debug_flags;
use crate::fetcher::{HttpTransport, StatusFetcher};
use crate::framebuffer::{self, Framebuffer, Screen, FB_HEIGHT};
use crate::status::StatusSnapshot;

/// Minimum spacing between status requests.
pub const POLL_INTERVAL: Duration = Duration::from_secs(45);
/// Sleep between loop iterations once running.
pub const LOOP_IDLE: Duration = Duration::from_secs(1);
/// Warn on the first failure and every Nth consecutive one after.
const FAILURE_WARN_EVERY: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Booting,
    Connecting,
    TimeSyncing,
    Ready,
}

/// Owns every piece of runtime state: the link, the fetcher, the panel and
/// the last known snapshot. Frames are painted band by band through one
/// small buffer.
pub struct PollLoop<L, H, P> {
    connection: ConnectionManager<L>,
    fetcher: StatusFetcher<H>,
    screen: P,
    band: Framebuffer,
    wifi_ssid: String,
    wifi_pass: String,
    utc_offset_secs: i32,
    debug: bool,
    phase: Phase,
    last_known: StatusSnapshot,
    /// Latest server time seen, and when it arrived. Payloads without one
    /// leave both alone.
    server_time: Option<ServerTime>,
    server_time_at: Option<Instant>,
    last_attempt: Option<Instant>,
    fetch_ok: bool,
    consecutive_failures: u32,
    last_frame: Option<Dashboard>,
}

impl<L: Link, H: HttpTransport, P: Screen> PollLoop<L, H, P> {
    pub fn new(
        connection: ConnectionManager<L>,
        fetcher: StatusFetcher<H>,
        screen: P,
        cfg: &Config,
    ) -> Self {
        Self {
            connection,
            fetcher,
            screen,
            band: Framebuffer::band(),
            wifi_ssid: cfg.wifi_ssid.clone(),
            wifi_pass: cfg.wifi_pass.clone(),
            utc_offset_secs: cfg.utc_offset_secs,
            debug: cfg.debug,
            phase: Phase::Booting,
            last_known: StatusSnapshot::default(),
            server_time: None,
            server_time_at: None,
            last_attempt: None,
            fetch_ok: false,
            consecutive_failures: 0,
            last_frame: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.last_known
    }

    /// Layout of the most recent render.
    pub fn last_frame(&self) -> Option<&Dashboard> {
        self.last_frame.as_ref()
    }

    /// Bring-up: join the network (blocks until it works), one clock sync
    /// attempt, then an offline placeholder frame.
    pub fn start<T: TimeSource>(&mut self, time: &mut T) {
        self.phase = Phase::Connecting;
        let status = format!("Connecting to '{}'...", self.wifi_ssid);
        self.splash(&status);
        let ip = self.connection.connect(&self.wifi_ssid, &self.wifi_pass);
        if debug_flags::verbose() {
            info!("Network up, IP: {}", ip);
        }

        self.phase = Phase::TimeSyncing;
        self.splash("Syncing time...");
        connection::sync_clock(time, NTP_SERVER, self.utc_offset_secs);

        // Nothing fetched yet.
        self.render(Instant::now(), clock::wall_clock_now());
        self.phase = Phase::Ready;
        if debug_flags::verbose() {
            info!("Polling {} every {}s", self.fetcher.url(), POLL_INTERVAL.as_secs());
        }
    }

    /// One pass of the running loop. Fetches if due, then always redraws.
    /// Returns whether a fetch was attempted.
    pub fn tick(&mut self, now: Instant, wall_utc: Option<i64>) -> bool {
        let due = match self.last_attempt {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= POLL_INTERVAL,
        };
        if due {
            self.last_attempt = Some(now);
            self.poll_status(now);
        }
        self.render(now, wall_utc);
        due
    }

    pub fn run<T: TimeSource>(mut self, time: &mut T) -> ! {
        self.start(time);
        loop {
            self.tick(Instant::now(), clock::wall_clock_now());
            thread::sleep(LOOP_IDLE);
        }
    }

    fn poll_status(&mut self, now: Instant) {
        let verbose = debug_flags::verbose();
        match self.fetcher.refresh(&mut self.last_known) {
            Ok(()) => {
                if self.consecutive_failures > 0 {
                    info!(
                        "Status fetch recovered after {} consecutive failures",
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
                self.fetch_ok = true;
                if let Some(t) = self.last_known.server_time {
                    self.server_time = Some(t);
                    self.server_time_at = Some(now);
                }
                if verbose {
                    info!(
                        "Status: '{}', word '{}', {} ({}/{} services up)",
                        self.last_known.bottom_line,
                        self.last_known.word_of_day,
                        self.last_known.expression_state.as_str(),
                        self.last_known.services_up(),
                        self.last_known.services.len()
                    );
                }
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.fetch_ok = false;
                if self.consecutive_failures == 1
                    || self.consecutive_failures % FAILURE_WARN_EVERY == 0
                {
                    warn!(
                        "Status fetch failed ({} consecutive): {}",
                        self.consecutive_failures, e
                    );
                } else if verbose {
                    info!(
                        "Status fetch failed ({} consecutive): {}",
                        self.consecutive_failures, e
                    );
                }
            }
        }
    }

    fn render(&mut self, now: Instant, wall_utc: Option<i64>) {
        let ctx = RenderContext {
            wall_utc,
            utc_offset_secs: self.utc_offset_secs,
            server_time: self.server_time,
            since_capture: self
                .server_time_at
                .map(|at| now.saturating_duration_since(at))
                .unwrap_or_default(),
            local_ip: self.connection.local_ip(),
            debug: self.debug,
        };
        let frame = Dashboard::build(&self.last_known, !self.fetch_ok, &ctx);
        let painted = framebuffer::paint_frame(&mut self.band, &mut self.screen, FB_HEIGHT, |fb| {
            frame.draw(fb)
        });
        if let Err(e) = painted {
            warn!("Panel update failed: {:#}", e);
        }
        self.last_frame = Some(frame);
    }

    fn splash(&mut self, status: &str) {
        let painted = framebuffer::paint_frame(&mut self.band, &mut self.screen, FB_HEIGHT, |fb| {
            dashboard::draw_splash(fb, status)
        });
        if let Err(e) = painted {
            warn!("Panel update failed: {:#}", e);
        }
    }
}
