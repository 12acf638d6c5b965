//! Deterministic mock implementation of the `assist_transport` collaborators.
//!
//! This crate contains no network logic and is intended for local development
//! and contract-level integration testing.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use assist_transport::{
    ByteStream, CollaboratorError, ResponseStreamOpener, SessionFactory, SessionId,
};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// Prefix of the demo echo reply.
pub const DEMO_REPLY_PREFIX: &str = "Demo response (no LLM configured): you said -> ";

/// What the mock streams back for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// Echo the message after [`DEMO_REPLY_PREFIX`], one character per delta.
    DemoEcho,
    /// Stream these deltas regardless of the message.
    Fixed(Vec<String>),
}

impl Script {
    fn deltas(&self, text: &str) -> Vec<String> {
        match self {
            Self::DemoEcho => format!("{DEMO_REPLY_PREFIX}{text}")
                .chars()
                .map(String::from)
                .collect(),
            Self::Fixed(deltas) => deltas.clone(),
        }
    }
}

/// Injected failure for stream requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFailure {
    /// The request is refused before any body is sent.
    Rejected { status: u16, detail: String },
    /// An `error` frame follows the first `after` deltas.
    ErrorFrame { after: usize, message: String },
    /// The body ends after `after` deltas with no terminal frame.
    AbruptClose { after: usize },
    /// Reading fails after `after` deltas.
    ReadError { after: usize, detail: String },
}

/// Deterministic backend used by `assist_cli` and tests.
#[derive(Debug)]
pub struct MockBackend {
    script: Script,
    chunk_delay: Duration,
    chunk_bytes: Option<usize>,
    omit_session_id: bool,
    stream_failure: Option<StreamFailure>,
    pending_session_failures: AtomicUsize,
    next_session_id: AtomicU64,
    session_calls: AtomicUsize,
    stream_calls: AtomicUsize,
}

impl MockBackend {
    pub const DEMO_DELAY_MS: u64 = 10;

    /// Creates a backend streaming `script` with no delay between chunks.
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self {
            script,
            chunk_delay: Duration::ZERO,
            chunk_bytes: None,
            omit_session_id: false,
            stream_failure: None,
            pending_session_failures: AtomicUsize::new(0),
            next_session_id: AtomicU64::new(1),
            session_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
        }
    }

    /// Creates a backend streaming the given deltas.
    #[must_use]
    pub fn fixed<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Script::Fixed(deltas.into_iter().map(Into::into).collect()))
    }

    #[must_use]
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Re-split the body into pieces of `bytes` length, ignoring frame boundaries.
    #[must_use]
    pub fn with_chunk_bytes(mut self, bytes: usize) -> Self {
        self.chunk_bytes = Some(bytes.max(1));
        self
    }

    /// The first `count` session creations fail with HTTP 503.
    #[must_use]
    pub fn with_session_failures(self, count: usize) -> Self {
        self.pending_session_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Session creation succeeds but carries no identifier.
    #[must_use]
    pub fn without_session_id(mut self) -> Self {
        self.omit_session_id = true;
        self
    }

    #[must_use]
    pub fn with_stream_failure(mut self, failure: StreamFailure) -> Self {
        self.stream_failure = Some(failure);
        self
    }

    pub fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Full response body for `text`, as the frames a server would send.
    pub fn body_for(&self, text: &str) -> Vec<Vec<u8>> {
        let deltas = self.script.deltas(text);
        let (kept, tail) = match &self.stream_failure {
            Some(StreamFailure::ErrorFrame { after, message }) => (
                *after,
                Some(frame("error", &json!({ "message": message }))),
            ),
            Some(StreamFailure::AbruptClose { after })
            | Some(StreamFailure::ReadError { after, .. }) => (*after, None),
            _ => (deltas.len(), Some(frame("done", &json!({})))),
        };

        let mut frames: Vec<Vec<u8>> = deltas
            .iter()
            .take(kept)
            .map(|delta| frame("delta", &json!({ "text": delta })))
            .collect();
        frames.extend(tail);

        match self.chunk_bytes {
            Some(size) => frames
                .concat()
                .chunks(size)
                .map(<[u8]>::to_vec)
                .collect(),
            None => frames,
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(Script::DemoEcho)
            .with_chunk_delay(Duration::from_millis(Self::DEMO_DELAY_MS))
    }
}

#[async_trait]
impl SessionFactory for MockBackend {
    async fn create_session(&self) -> Result<Value, CollaboratorError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .pending_session_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |pending| {
                pending.checked_sub(1)
            })
            .is_ok();
        if failing {
            return Err(CollaboratorError::with_status(
                503,
                "mock session service unavailable",
            ));
        }

        if self.omit_session_id {
            return Ok(json!({ "status": "ok" }));
        }
        let session_id = self.next_session_id.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "session_id": session_id, "title": "New chat" }))
    }
}

#[async_trait]
impl ResponseStreamOpener for MockBackend {
    async fn open_response_stream(
        &self,
        _session_id: &SessionId,
        text: &str,
    ) -> Result<ByteStream, CollaboratorError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(StreamFailure::Rejected { status, detail }) = &self.stream_failure {
            return Err(CollaboratorError::with_status(*status, detail.clone()));
        }

        let read_error = match &self.stream_failure {
            Some(StreamFailure::ReadError { detail, .. }) => {
                Some(Err(CollaboratorError::new(detail.clone())))
            }
            _ => None,
        };
        let delay = self.chunk_delay;
        let chunks = self
            .body_for(text)
            .into_iter()
            .map(Ok)
            .chain(read_error);

        Ok(stream::iter(chunks)
            .then(move |chunk| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                chunk
            })
            .boxed())
    }
}

fn frame(event: &str, data: &Value) -> Vec<u8> {
    format!("event: {event}\ndata: {data}\n\n").into_bytes()
}
