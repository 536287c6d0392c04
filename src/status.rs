use log::info;
use serde_json::{Map, Value};

use crate::clock::ServerTime;
use crate::error::FetchError;

/// Upper bound on an accepted `/status/compact` body.
pub const MAX_PAYLOAD_BYTES: usize = 4096;
/// Service rows the dashboard has room for.
pub const MAX_SERVICES: usize = 4;

const DEFAULT_BOTTOM_LINE: &str = "All good";
const DEFAULT_WORD: &str = "None";
const DEFAULT_SERVICE_NAME: &str = "?";

// ── Data types ──────────────────────────────────────────────────────

/// Mood tag from `expression.state`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Expression {
    #[default]
    Idle,
    Happy,
    Thinking,
    Warning,
    Error,
    /// Any state string this client does not know, kept verbatim.
    Other(String),
}

impl Expression {
    pub fn parse(s: &str) -> Self {
        match s {
            "idle" => Expression::Idle,
            "happy" => Expression::Happy,
            "thinking" => Expression::Thinking,
            "warning" => Expression::Warning,
            "error" => Expression::Error,
            other => Expression::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Expression::Idle => "idle",
            Expression::Happy => "happy",
            Expression::Thinking => "thinking",
            Expression::Warning => "warning",
            Expression::Error => "error",
            Expression::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceItem {
    pub name: String,
    pub is_up: bool,
}

/// Fixed-capacity service list. Pushing past capacity drops the entry.
pub type Services = heapless::Vec<ServiceItem, MAX_SERVICES>;

/// Last good status payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub bottom_line: String,
    pub word_of_day: String,
    pub expression_state: Expression,
    pub expression_message: String,
    pub services: Services,
    /// None until a payload carries a parseable `server_time`.
    pub server_time: Option<ServerTime>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        StatusSnapshot {
            bottom_line: DEFAULT_BOTTOM_LINE.to_string(),
            word_of_day: DEFAULT_WORD.to_string(),
            expression_state: Expression::Idle,
            expression_message: String::new(),
            services: Services::new(),
            server_time: None,
        }
    }
}

impl StatusSnapshot {
    pub fn services_up(&self) -> usize {
        self.services.iter().filter(|s| s.is_up).count()
    }
}

// ── Field helpers ───────────────────────────────────────────────────

/// String at `path`, or None if any step is missing or not the right type.
fn str_at<'a>(root: &'a Map<String, Value>, path: &[&str]) -> Option<&'a str> {
    let (last, parents) = path.split_last()?;
    let mut obj = root;
    for key in parents {
        obj = obj.get(*key)?.as_object()?;
    }
    obj.get(*last)?.as_str()
}

fn parse_services(root: &Map<String, Value>) -> Services {
    let mut services = Services::new();
    let Some(entries) = root.get("services").and_then(Value::as_array) else {
        return services;
    };
    for entry in entries.iter().take(MAX_SERVICES) {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SERVICE_NAME);
        let is_up = entry.get("is_up").and_then(Value::as_bool).unwrap_or(false);
        // take() already bounds the loop; a full list just drops the entry.
        let _ = services.push(ServiceItem {
            name: name.to_string(),
            is_up,
        });
    }
    services
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Parse a `/status/compact` body into a fresh snapshot.
///
/// Only an oversized body or structurally invalid JSON is an error. Missing
/// and wrong-typed fields fall back to their defaults.
pub fn parse_status(body: &[u8]) -> Result<StatusSnapshot, FetchError> {
    if body.len() > MAX_PAYLOAD_BYTES {
        return Err(FetchError::Parse(format!(
            "payload of {} bytes exceeds {} byte limit",
            body.len(),
            MAX_PAYLOAD_BYTES
        )));
    }

    let root: Value = serde_json::from_slice(body)?;
    let Some(root) = root.as_object() else {
        return Err(FetchError::Parse("top-level JSON is not an object".to_string()));
    };

    let defaults = StatusSnapshot::default();
    let raw_time = str_at(root, &["server_time"]);
    let server_time = raw_time.and_then(ServerTime::parse);
    if let (Some(raw), None) = (raw_time, server_time) {
        if crate::debug_flags::verbose() {
            info!("status: server_time {:?} not understood, clock unknown", raw);
        }
    }

    let snapshot = StatusSnapshot {
        bottom_line: str_at(root, &["bottom_line"])
            .map(str::to_string)
            .unwrap_or(defaults.bottom_line),
        word_of_day: str_at(root, &["word_of_day", "word"])
            .map(str::to_string)
            .unwrap_or(defaults.word_of_day),
        expression_state: str_at(root, &["expression", "state"])
            .map(Expression::parse)
            .unwrap_or(defaults.expression_state),
        expression_message: str_at(root, &["expression", "message"])
            .map(str::to_string)
            .unwrap_or(defaults.expression_message),
        services: parse_services(root),
        server_time,
    };

    if crate::debug_flags::verbose() {
        info!(
            "status: expression={} services={}/{} up word={:?}",
            snapshot.expression_state.as_str(),
            snapshot.services_up(),
            snapshot.services.len(),
            snapshot.word_of_day
        );
    }

    Ok(snapshot)
}
