use std::fmt;

use assist_transport::CollaboratorError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Error as JsonError, Value};

#[derive(Debug)]
pub enum AssistApiError {
    InvalidBaseUrl(String),
    UrlResolution(String),
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
}

impl AssistApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status, _) => Some(*status),
            Self::Request(error) => error.status(),
            _ => None,
        }
    }
}

/// Error body shapes seen from the backend.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    detail: Option<Value>,
    error: Option<ErrorPayloadFields>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorPayloadFields {
    Nested { message: Option<String> },
    Text(String),
}

impl ErrorPayload {
    fn message(&self) -> Option<String> {
        let detail = self.detail.as_ref().and_then(|detail| match detail {
            Value::String(text) => non_empty_string(text).map(str::to_owned),
            Value::Null => None,
            other => Some(other.to_string()),
        });
        let error = self.error.as_ref().and_then(|error| match error {
            ErrorPayloadFields::Nested { message } => {
                message.as_deref().and_then(non_empty_string).map(str::to_owned)
            }
            ErrorPayloadFields::Text(text) => non_empty_string(text).map(str::to_owned),
        });
        let message = self
            .message
            .as_deref()
            .and_then(non_empty_string)
            .map(str::to_owned);

        detail.or(error).or(message)
    }
}

impl fmt::Display for AssistApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::UrlResolution(message) => write!(f, "URL resolution failed: {message}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for AssistApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AssistApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for AssistApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

impl From<AssistApiError> for CollaboratorError {
    fn from(error: AssistApiError) -> Self {
        match error {
            AssistApiError::Status(status, message) => {
                CollaboratorError::with_status(status.as_u16(), message)
            }
            other => match other.status() {
                Some(status) => CollaboratorError::with_status(status.as_u16(), other.to_string()),
                None => CollaboratorError::new(other.to_string()),
            },
        }
    }
}

/// Friendly message for a non-success response body.
///
/// Tries `{"detail"}`, `{"error":{"message"}}` (or `{"error":"..."}`), then
/// `{"message"}`; otherwise the raw body, or the canonical reason when empty.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.message())
        .unwrap_or_else(|| body.to_string())
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
