use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::error::{LinkError, TimeSyncError};

/// Interval between link status polls while joining.
pub const LINK_POLL: Duration = Duration::from_millis(500);
/// Polls between re-issued join requests.
pub const REJOIN_EVERY_POLLS: u32 = 20;
/// Bounded wait for the one-shot clock sync.
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// Station-mode network link.
pub trait Link {
    /// Start (or restart) joining `ssid`. Returns once the request is issued.
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), LinkError>;

    /// True while associated with the access point, with or without an
    /// address.
    fn is_associated(&self) -> bool;

    /// Address once DHCP has assigned one and the interface is up.
    fn local_ip(&self) -> Option<Ipv4Addr>;
}

/// One-shot wall-clock sync.
pub trait TimeSource {
    /// Request a sync from `server` and wait at most `timeout` for it.
    fn sync(&mut self, server: &str, timeout: Duration) -> Result<(), TimeSyncError>;
}

pub struct ConnectionManager<L> {
    link: L,
    poll: Duration,
}

impl<L: Link> ConnectionManager<L> {
    pub fn new(link: L) -> Self {
        Self::with_poll_interval(link, LINK_POLL)
    }

    pub fn with_poll_interval(link: L, poll: Duration) -> Self {
        Self { link, poll }
    }

    #[cfg(test)]
    pub(crate) fn link(&self) -> &L {
        &self.link
    }

    pub fn local_ip(&self) -> Option<Ipv4Addr> {
        if self.link.is_associated() {
            self.link.local_ip()
        } else {
            None
        }
    }

    /// Block until the link is associated and holds an address. There is
    /// no timeout and no backoff: without a network this device has nothing
    /// else to do. A join is re-issued only while unassociated, so a slow
    /// DHCP lease is waited out rather than torn down.
    pub fn connect(&mut self, ssid: &str, password: &str) -> Ipv4Addr {
        let verbose = crate::debug_flags::verbose();
        if verbose {
            info!("WiFi connecting to '{}'...", ssid);
        }
        let mut polls: u32 = 0;
        let mut joins: u32 = 0;
        let mut associated = false;
        loop {
            if polls % REJOIN_EVERY_POLLS == 0 && !associated {
                joins = joins.saturating_add(1);
                match self.link.begin(ssid, password) {
                    Ok(()) if verbose => info!("WiFi join request {} issued", joins),
                    Ok(()) => {}
                    Err(e) => warn!("WiFi join request {} failed: {}", joins, e),
                }
            }

            polls = polls.wrapping_add(1);
            thread::sleep(self.poll);

            associated = self.link.is_associated();
            if associated {
                if let Some(ip) = self.link.local_ip() {
                    if verbose {
                        info!(
                            "WiFi connected to '{}' after {} polls, IP: {}",
                            ssid, polls, ip
                        );
                    }
                    return ip;
                }
            }

            if verbose && polls % REJOIN_EVERY_POLLS == 0 {
                let waiting_for = if associated { "an address" } else { "association" };
                info!("WiFi still waiting for {} on '{}' ({} polls)", waiting_for, ssid, polls);
            }
        }
    }
}

/// Best-effort clock sync. Returns whether the clock is now set; a failure
/// is logged and never retried.
pub fn sync_clock<T: TimeSource>(source: &mut T, ntp_server: &str, utc_offset_secs: i32) -> bool {
    let verbose = crate::debug_flags::verbose();
    if verbose {
        info!(
            "SNTP sync with {} (UTC offset {}s, wait {}s)",
            ntp_server,
            utc_offset_secs,
            SYNC_TIMEOUT.as_secs()
        );
    }
    match source.sync(ntp_server, SYNC_TIMEOUT) {
        Ok(()) => {
            match crate::clock::wall_clock_now() {
                Some(utc) if verbose => {
                    let local = crate::clock::local_from_utc(utc, utc_offset_secs);
                    info!("SNTP synced, local time {} {}", local.date_text(), local.time_text_secs());
                }
                _ => {}
            }
            true
        }
        Err(e) => {
            warn!("SNTP sync failed: {} (clock unknown until reboot)", e);
            false
        }
    }
}
