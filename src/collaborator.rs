//! Network capabilities the transport core consumes but does not implement.

use std::fmt;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::Value;

use crate::identifier::SessionId;

/// Raw response body, delivered in arbitrary chunks.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, CollaboratorError>>;

/// Creates a remote conversation and returns the raw creation response.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create_session(&self) -> Result<Value, CollaboratorError>;
}

/// Sends one user message and returns the streamed response body.
#[async_trait]
pub trait ResponseStreamOpener: Send + Sync {
    async fn open_response_stream(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<ByteStream, CollaboratorError>;
}

/// Failure reported by a collaborator, optionally with an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorError {
    status: Option<u16>,
    detail: String,
}

impl CollaboratorError {
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            status: None,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn with_status(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.detail),
            None => f.write_str(&self.detail),
        }
    }
}

impl std::error::Error for CollaboratorError {}

impl From<String> for CollaboratorError {
    fn from(detail: String) -> Self {
        Self::new(detail)
    }
}

impl From<&str> for CollaboratorError {
    fn from(detail: &str) -> Self {
        Self::new(detail)
    }
}
