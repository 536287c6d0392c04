use log::{info, warn};

/// NVS namespace holding load-time overrides.
pub const NS: &str = "dash_cfg";

/// Fixed request path on the status backend.
pub const STATUS_PATH: &str = "/status/compact";
pub const NTP_SERVER: &str = "pool.ntp.org";

const DEFAULT_WIFI_SSID: &str = "your-ssid";
const DEFAULT_WIFI_PASS: &str = "your-password";
const DEFAULT_STATUS_HOST: &str = "192.168.1.100";
const DEFAULT_STATUS_PORT: u16 = 8000;
const DEFAULT_UTC_OFFSET: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub status_host: String,
    pub status_port: u16,
    /// Seconds east of UTC. Static, no daylight saving.
    pub utc_offset_secs: i32,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            wifi_ssid: DEFAULT_WIFI_SSID.to_string(),
            wifi_pass: DEFAULT_WIFI_PASS.to_string(),
            status_host: DEFAULT_STATUS_HOST.to_string(),
            status_port: DEFAULT_STATUS_PORT,
            utc_offset_secs: DEFAULT_UTC_OFFSET,
            debug: false,
        }
    }
}

pub fn parse_port(s: &str) -> Option<u16> {
    match s.trim().parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

/// UTC-12 .. UTC+14
pub fn offset_in_range(offset: i32) -> bool {
    (-12 * 3600..=14 * 3600).contains(&offset)
}

pub fn parse_offset(s: &str) -> Option<i32> {
    let offset = s.trim().parse::<i32>().ok()?;
    offset_in_range(offset).then_some(offset)
}

pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Defaults baked in at build time from `dashboard.local.rs`, falling
    /// back to placeholders for anything the file does not set.
    pub fn compiled() -> Config {
        Config::from_values(
            option_env!("LOCAL_WIFI_SSID"),
            option_env!("LOCAL_WIFI_PASS"),
            option_env!("LOCAL_STATUS_HOST"),
            option_env!("LOCAL_STATUS_PORT"),
            option_env!("LOCAL_UTC_OFFSET"),
            option_env!("LOCAL_DEBUG"),
        )
    }

    fn from_values(
        ssid: Option<&str>,
        pass: Option<&str>,
        host: Option<&str>,
        port: Option<&str>,
        offset: Option<&str>,
        debug: Option<&str>,
    ) -> Config {
        let defaults = Config::default();
        Config {
            wifi_ssid: ssid.map(str::to_string).unwrap_or(defaults.wifi_ssid),
            wifi_pass: pass.map(str::to_string).unwrap_or(defaults.wifi_pass),
            status_host: host
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.status_host),
            status_port: port.and_then(parse_port).unwrap_or(defaults.status_port),
            utc_offset_secs: offset.and_then(parse_offset).unwrap_or(defaults.utc_offset_secs),
            debug: debug.and_then(parse_flag).unwrap_or(defaults.debug),
        }
    }

    pub fn status_url(&self) -> String {
        format!("http://{}:{}{}", self.status_host, self.status_port, STATUS_PATH)
    }

    /// Apply stored overrides on top of `self`. Values that would not
    /// work (blank host, port 0, an offset no zone uses) are skipped with a
    /// warning and the current value stays.
    pub fn with_overrides(mut self, stored: StoredOverrides) -> Config {
        if let Some(ssid) = stored.wifi_ssid.filter(|s| !s.is_empty()) {
            self.wifi_ssid = ssid;
        }
        if let Some(pass) = stored.wifi_pass {
            self.wifi_pass = pass;
        }
        if let Some(host) = stored.status_host {
            let host = host.trim();
            if host.is_empty() {
                warn!("stored status_host is blank, keeping {:?}", self.status_host);
            } else {
                self.status_host = host.to_string();
            }
        }
        match stored.status_port {
            Some(0) => warn!("stored status_port is 0, keeping {}", self.status_port),
            Some(port) => self.status_port = port,
            None => {}
        }
        match stored.utc_offset {
            Some(offset) if offset_in_range(offset) => self.utc_offset_secs = offset,
            Some(offset) => warn!(
                "stored utc_offset {}s is outside UTC-12..UTC+14, keeping {}s",
                offset, self.utc_offset_secs
            ),
            None => {}
        }
        if let Some(debug) = stored.debug {
            self.debug = debug != 0;
        }
        self
    }

    pub fn log_summary(&self) {
        info!("config wifi_ssid = {:?}", self.wifi_ssid);
        info!("config wifi_pass = <{} chars>", self.wifi_pass.len());
        info!("config status_url = {}", self.status_url());
        info!("config utc_offset = {}s", self.utc_offset_secs);
        info!("config debug = {}", self.debug);
    }
}

/// Raw values from the NVS namespace, before validation. None means the
/// key is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredOverrides {
    pub wifi_ssid: Option<String>,
    pub wifi_pass: Option<String>,
    pub status_host: Option<String>,
    pub status_port: Option<u16>,
    pub utc_offset: Option<i32>,
    pub debug: Option<u8>,
}

#[cfg(target_os = "espidf")]
mod nvs {
    use esp_idf_svc::nvs::{EspNvs, NvsDefault};

    use super::{Config, StoredOverrides};

    const KEY_WIFI_SSID: &str = "wifi_ssid";
    const KEY_WIFI_PASS: &str = "wifi_pass";
    const KEY_STATUS_HOST: &str = "status_host";
    const KEY_STATUS_PORT: &str = "status_port";
    const KEY_UTC_OFFSET: &str = "utc_offset";
    const KEY_DEBUG: &str = "debug";

    /// Read a string from NVS, returning None if the key is absent or on error.
    fn nvs_get_str(nvs: &EspNvs<NvsDefault>, key: &str) -> Option<String> {
        let len = match nvs.str_len(key) {
            Ok(Some(len)) => len,
            _ => return None,
        };

        let mut buf = vec![0u8; len];
        match nvs.get_str(key, &mut buf) {
            Ok(Some(val)) => {
                let s = val.trim_end_matches('\0').to_string();
                if s.is_empty() { None } else { Some(s) }
            }
            _ => None,
        }
    }

    impl StoredOverrides {
        pub fn read(nvs: &EspNvs<NvsDefault>) -> StoredOverrides {
            StoredOverrides {
                wifi_ssid: nvs_get_str(nvs, KEY_WIFI_SSID),
                wifi_pass: nvs_get_str(nvs, KEY_WIFI_PASS),
                status_host: nvs_get_str(nvs, KEY_STATUS_HOST),
                status_port: nvs.get_u16(KEY_STATUS_PORT).unwrap_or(None),
                utc_offset: nvs.get_i32(KEY_UTC_OFFSET).unwrap_or(None),
                debug: nvs.get_u8(KEY_DEBUG).unwrap_or(None),
            }
        }
    }

    impl Config {
        /// Apply any overrides stored in NVS on top of `self`. Read once at
        /// boot; nothing writes these back at runtime.
        pub fn with_nvs_overrides(self, nvs: &EspNvs<NvsDefault>) -> Config {
            self.with_overrides(StoredOverrides::read(nvs))
        }
    }
}
