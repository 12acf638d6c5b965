use serde::{Deserialize, Serialize};

/// Frame kind carrying an incremental text fragment.
pub const EVENT_DELTA: &str = "delta";
/// Frame kind ending a stream successfully.
pub const EVENT_DONE: &str = "done";
/// Frame kind ending a stream with a failure.
pub const EVENT_ERROR: &str = "error";
/// Kind assumed when a frame has no `event` field.
pub const DEFAULT_EVENT_KIND: &str = "message";

/// Typed event decoded from one complete frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameEvent {
    Delta {
        text: String,
    },
    Done,
    Error {
        detail: Option<String>,
    },
    /// Any other kind, passed through with its raw payload.
    Other {
        kind: String,
        data: String,
    },
}

impl FrameEvent {
    pub fn kind(&self) -> &str {
        match self {
            Self::Delta { .. } => EVENT_DELTA,
            Self::Done => EVENT_DONE,
            Self::Error { .. } => EVENT_ERROR,
            Self::Other { kind, .. } => kind,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

/// Terminal state of one decoded stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    #[default]
    Pending,
    Done,
    Error,
}

impl Terminal {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}
