use std::sync::atomic::{AtomicBool, Ordering};

/// Verbose trace of connection, clock sync, request and parse events, plus
/// the on-screen debug footer. Set once at boot from the config.
pub static DEBUG_STATUS: AtomicBool = AtomicBool::new(false);

pub fn is_on(flag: &AtomicBool) -> bool {
    flag.load(Ordering::Relaxed)
}

pub fn set(flag: &AtomicBool, val: bool) {
    flag.store(val, Ordering::Relaxed);
}

/// Shorthand for the status trace flag.
pub fn verbose() -> bool {
    is_on(&DEBUG_STATUS)
}

pub fn status_line() -> String {
    format!("status={}", if verbose() { "ON" } else { "off" })
}
