use log::info;

use crate::error::FetchError;
use crate::status::{self, StatusSnapshot, MAX_PAYLOAD_BYTES};

/// Raw reply from a transport: status code plus at most `limit + 1` body
/// bytes, so the caller can tell an oversized body from one at the limit.
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Plain HTTP GET. Connection failures are `FetchError::Http`.
pub trait HttpTransport {
    fn get(&mut self, url: &str, limit: usize) -> Result<HttpReply, FetchError>;
}

pub struct StatusFetcher<T> {
    transport: T,
    url: String,
}

impl<T: HttpTransport> StatusFetcher<T> {
    pub fn new(transport: T, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// One request/parse cycle.
    pub fn fetch(&mut self) -> Result<StatusSnapshot, FetchError> {
        let verbose = crate::debug_flags::verbose();
        if verbose {
            info!("GET {}", self.url);
        }
        let reply = self.transport.get(&self.url, MAX_PAYLOAD_BYTES)?;
        if verbose {
            info!("GET {} -> status {} ({} bytes)", self.url, reply.status, reply.body.len());
        }
        if reply.status != 200 {
            return Err(FetchError::Http(format!("status {}", reply.status)));
        }
        status::parse_status(&reply.body)
    }

    /// Fetch and, only on success, replace `last_known` wholesale.
    pub fn refresh(&mut self, last_known: &mut StatusSnapshot) -> Result<(), FetchError> {
        *last_known = self.fetch()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned replies in order.
    pub(crate) struct ScriptedTransport {
        pub replies: VecDeque<Result<HttpReply, FetchError>>,
        pub requests: Vec<String>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(replies: Vec<Result<HttpReply, FetchError>>) -> Self {
            Self {
                replies: replies.into(),
                requests: Vec::new(),
            }
        }
    }

    pub(crate) fn ok(body: &str) -> Result<HttpReply, FetchError> {
        Ok(HttpReply {
            status: 200,
            body: body.as_bytes().to_vec(),
        })
    }

    impl HttpTransport for ScriptedTransport {
        fn get(&mut self, url: &str, limit: usize) -> Result<HttpReply, FetchError> {
            self.requests.push(url.to_string());
            let mut reply = self
                .replies
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Http("connection refused".to_string())));
            if let Ok(r) = &mut reply {
                r.body.truncate(limit + 1);
            }
            reply
        }
    }

    const URL: &str = "http://10.0.0.2:8000/status/compact";

    fn known_good() -> StatusSnapshot {
        let mut fetcher = StatusFetcher::new(
            ScriptedTransport::new(vec![ok(
                r#"{"bottom_line": "Backups ran", "services": [{"name": "nas", "is_up": true}]}"#,
            )]),
            URL,
        );
        fetcher.fetch().unwrap()
    }

    #[test]
    fn fetch_requests_the_configured_url() {
        let mut fetcher = StatusFetcher::new(ScriptedTransport::new(vec![ok("{}")]), URL);
        let snapshot = fetcher.fetch().unwrap();
        assert_eq!(snapshot, StatusSnapshot::default());
        assert_eq!(fetcher.transport.requests, [URL]);
        assert_eq!(fetcher.url(), URL);
    }

    #[test]
    fn non_200_is_an_http_error() {
        let reply = Ok(HttpReply {
            status: 503,
            body: b"{}".to_vec(),
        });
        let mut fetcher = StatusFetcher::new(ScriptedTransport::new(vec![reply]), URL);
        assert!(matches!(fetcher.fetch(), Err(FetchError::Http(_))));
    }

    #[test]
    fn refresh_replaces_snapshot_on_success() {
        let mut last_known = StatusSnapshot::default();
        let mut fetcher = StatusFetcher::new(
            ScriptedTransport::new(vec![ok(r#"{"bottom_line": "Backups ran"}"#)]),
            URL,
        );
        fetcher.refresh(&mut last_known).unwrap();
        assert_eq!(last_known.bottom_line, "Backups ran");
    }

    #[test]
    fn failed_refresh_leaves_snapshot_untouched() {
        let before = known_good();
        let mut last_known = before.clone();
        let mut fetcher = StatusFetcher::new(
            ScriptedTransport::new(vec![
                Err(FetchError::Http("connection refused".to_string())),
                Ok(HttpReply {
                    status: 500,
                    body: Vec::new(),
                }),
                ok(r#"{"bottom_line": "half"#),
                ok(&format!(r#"{{"bottom_line": "{}"}}"#, "z".repeat(8000))),
            ]),
            URL,
        );

        assert!(matches!(fetcher.refresh(&mut last_known), Err(FetchError::Http(_))));
        assert!(matches!(fetcher.refresh(&mut last_known), Err(FetchError::Http(_))));
        assert!(matches!(fetcher.refresh(&mut last_known), Err(FetchError::Parse(_))));
        assert!(matches!(fetcher.refresh(&mut last_known), Err(FetchError::Parse(_))));
        assert_eq!(last_known, before);
    }
}
