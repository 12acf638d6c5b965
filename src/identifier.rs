//! Session identifiers and the ordered strategies used to pull one out of a
//! creation response.
//!
//! The upstream response shape is not documented. Each strategy handles one
//! shape seen in the wild; [`IdentifierExtractor`] tries them in order.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Field carrying the session identifier in creation responses.
pub const DEFAULT_SESSION_FIELD: &str = "session_id";
/// Wrapper object some clients place around response bodies.
pub const DEFAULT_ENVELOPE_FIELD: &str = "data";

/// Opaque identifier of a remote conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionId {
    Numeric(u64),
    Text(String),
}

impl SessionId {
    /// Accepts non-negative integers and non-blank strings.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_u64().map(Self::Numeric),
            Value::String(text) => Self::from_text(text),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self::Text(text.to_owned()))
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

/// One way of locating the identifier inside a creation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// `{ "<field>": 42 }`
    TopLevel { field: String },
    /// `{ "<envelope>": { "<field>": 42 } }`
    Enveloped { envelope: String, field: String },
    /// First `"<field>": <value>` occurrence anywhere in the serialized response.
    PatternScan { field: String },
}

impl ExtractionStrategy {
    pub fn top_level(field: impl Into<String>) -> Self {
        Self::TopLevel {
            field: field.into(),
        }
    }

    pub fn enveloped(envelope: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Enveloped {
            envelope: envelope.into(),
            field: field.into(),
        }
    }

    pub fn pattern_scan(field: impl Into<String>) -> Self {
        Self::PatternScan {
            field: field.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TopLevel { .. } => "top_level",
            Self::Enveloped { .. } => "enveloped",
            Self::PatternScan { .. } => "pattern_scan",
        }
    }

    pub fn extract(&self, response: &Value) -> Option<SessionId> {
        match self {
            Self::TopLevel { field } => response.get(field).and_then(SessionId::from_value),
            Self::Enveloped { envelope, field } => response
                .get(envelope)?
                .get(field)
                .and_then(SessionId::from_value),
            Self::PatternScan { field } => match response {
                // A body that arrived as text is scanned as-is, not re-quoted.
                Value::String(raw) => scan_for_field(raw, field),
                other => scan_for_field(&other.to_string(), field),
            },
        }
    }
}

/// Ordered list of [`ExtractionStrategy`] values, first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierExtractor {
    strategies: Vec<ExtractionStrategy>,
}

impl IdentifierExtractor {
    pub fn new(strategies: Vec<ExtractionStrategy>) -> Self {
        Self { strategies }
    }

    /// Top-level field, then the `data` envelope, then a raw text scan.
    pub fn for_field(field: &str) -> Self {
        Self::new(vec![
            ExtractionStrategy::top_level(field),
            ExtractionStrategy::enveloped(DEFAULT_ENVELOPE_FIELD, field),
            ExtractionStrategy::pattern_scan(field),
        ])
    }

    pub fn strategies(&self) -> &[ExtractionStrategy] {
        &self.strategies
    }

    pub fn extract(&self, response: &Value) -> Option<SessionId> {
        self.strategies.iter().find_map(|strategy| {
            let session_id = strategy.extract(response)?;
            debug!(strategy = strategy.name(), %session_id, "extracted session identifier");
            Some(session_id)
        })
    }
}

impl Default for IdentifierExtractor {
    fn default() -> Self {
        Self::for_field(DEFAULT_SESSION_FIELD)
    }
}

fn scan_for_field(raw: &str, field: &str) -> Option<SessionId> {
    let pattern = format!(
        r#""{}"\s*:\s*(?:(\d+)|"([^"\\]*)")"#,
        regex::escape(field)
    );
    let captures = Regex::new(&pattern).ok()?.captures(raw)?;

    if let Some(number) = captures.get(1) {
        return number.as_str().parse::<u64>().ok().map(SessionId::Numeric);
    }
    captures
        .get(2)
        .and_then(|text| SessionId::from_text(text.as_str()))
}
