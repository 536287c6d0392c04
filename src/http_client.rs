use std::time::Duration;

use embedded_svc::http::client::Client;
use embedded_svc::http::Method;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

use crate::error::FetchError;
use crate::fetcher::{HttpReply, HttpTransport};

const TIMEOUT: Duration = Duration::from_secs(10);

fn http(e: impl std::fmt::Display) -> FetchError {
    FetchError::Http(e.to_string())
}

/// Plain HTTP (no TLS) GET over the ESP-IDF client. A fresh connection per
/// request.
pub struct EspHttpTransport {
    timeout: Duration,
}

impl Default for EspHttpTransport {
    fn default() -> Self {
        Self { timeout: TIMEOUT }
    }
}

impl EspHttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HttpTransport for EspHttpTransport {
    fn get(&mut self, url: &str, limit: usize) -> Result<HttpReply, FetchError> {
        let config = Configuration {
            timeout: Some(self.timeout),
            ..Default::default()
        };
        let connection = EspHttpConnection::new(&config).map_err(http)?;
        let mut client = Client::wrap(connection);

        let headers = [("accept", "application/json")];
        let mut response = client
            .request(Method::Get, url, &headers)
            .map_err(http)?
            .submit()
            .map_err(http)?;
        let status = response.status();

        // Stop one byte past the limit; that is enough to reject the body.
        let mut body: Vec<u8> = Vec::new();
        let mut buf = [0u8; 512];
        while body.len() <= limit {
            let n = response.read(&mut buf).map_err(http)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
        }
        body.truncate(limit + 1);

        Ok(HttpReply { status, body })
    }
}
