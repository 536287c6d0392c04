use std::thread;
use std::time::{Duration, Instant};

use esp_idf_svc::sntp::{EspSntp, SntpConf, SyncStatus};
use log::info;

use crate::connection::TimeSource;
use crate::error::TimeSyncError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// SNTP client. A completed sync leaves the client running so the system
/// clock keeps being disciplined; a timed-out one is torn down.
#[derive(Default)]
pub struct EspTimeSource {
    sntp: Option<EspSntp<'static>>,
}

impl EspTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for EspTimeSource {
    fn sync(&mut self, server: &str, timeout: Duration) -> Result<(), TimeSyncError> {
        let mut conf: SntpConf<'_> = SntpConf::default();
        conf.servers[0] = server;

        let sntp = EspSntp::new(&conf).map_err(|e| TimeSyncError::Client(e.to_string()))?;

        let t0 = Instant::now();
        while t0.elapsed() < timeout {
            if sntp.get_sync_status() == SyncStatus::Completed {
                if crate::debug_flags::verbose() {
                    info!("SNTP time synchronized after {}ms", t0.elapsed().as_millis());
                }
                self.sntp = Some(sntp);
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }

        Err(TimeSyncError::Timeout(timeout.as_secs()))
    }
}
