//! Homelab status dashboard for a 320x240 SPI TFT on ESP-IDF.
//!
//! Portable logic (parsing, layout, the poll loop) builds and tests on the
//! host; the `Link`, `TimeSource`, `HttpTransport` and `Screen` seams get
//! their ESP-IDF implementations only on `target_os = "espidf"`.

pub mod clock;
pub mod config;
pub mod connection;
pub mod dashboard;
pub mod debug_flags;
pub mod error;
pub mod face;
pub mod fetcher;
pub mod framebuffer;
pub mod layout;
pub mod poll;
pub mod status;

#[cfg(target_os = "espidf")]
pub mod http_client;
#[cfg(target_os = "espidf")]
pub mod panel;
#[cfg(target_os = "espidf")]
pub mod time_sync;
#[cfg(target_os = "espidf")]
pub mod wifi;
