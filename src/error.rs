/// The station link could not be brought up. Retried forever by the
/// connection manager, never surfaced past it.
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("WiFi driver error: {0}")]
    Driver(String),
}

/// The one-shot clock sync did not complete. Logged, then the clock is left
/// unknown until the next boot.
#[derive(thiserror::Error, Debug)]
pub enum TimeSyncError {
    #[error("SNTP client error: {0}")]
    Client(String),

    #[error("no SNTP response within {0}s")]
    Timeout(u64),
}

/// A status fetch cycle failed. Both variants mean "offline" to the
/// renderer; the split only matters for the log.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
