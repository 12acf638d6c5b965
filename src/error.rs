use thiserror::Error;

use crate::collaborator::CollaboratorError;

/// Failure of a session acquisition. Cloneable so every waiter on a shared
/// creation attempt observes the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session creation failed{}: {detail}", status_suffix(.status))]
    CreationFailed { status: Option<u16>, detail: String },

    #[error("session identifier missing from creation response")]
    IdentifierMissing,
}

impl SessionError {
    #[must_use]
    pub fn creation_failed(error: &CollaboratorError) -> Self {
        Self::CreationFailed {
            status: error.status(),
            detail: error.detail().to_owned(),
        }
    }
}

/// Outcome of a failed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("message text is empty")]
    EmptyMessage,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("request failed{}: {detail}", status_suffix(.status))]
    RequestFailed { status: Option<u16>, detail: String },

    #[error("stream error: {detail}")]
    Stream { detail: String, partial: String },

    #[error("stream interrupted: {detail}")]
    StreamInterrupted { detail: String, partial: String },

    #[error("request was cancelled")]
    Cancelled { partial: String },
}

impl TransportError {
    #[must_use]
    pub fn request_failed(error: &CollaboratorError) -> Self {
        Self::RequestFailed {
            status: error.status(),
            detail: error.detail().to_owned(),
        }
    }

    /// Text received before the exchange failed, if the stream had started.
    #[must_use]
    pub fn partial_text(&self) -> Option<&str> {
        match self {
            Self::Stream { partial, .. }
            | Self::StreamInterrupted { partial, .. }
            | Self::Cancelled { partial } => Some(partial),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" (HTTP {status})"))
        .unwrap_or_default()
}
