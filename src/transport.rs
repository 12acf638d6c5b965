use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collaborator::{ByteStream, ResponseStreamOpener};
use crate::decoder::FrameDecoder;
use crate::error::TransportError;
use crate::events::FrameEvent;
use crate::identifier::SessionId;
use crate::session::SessionCoordinator;

/// How a successful exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A `done` frame arrived.
    Done,
    /// The body ended without any terminal frame; treated as complete.
    Closed,
}

/// Final assistant text of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub session_id: SessionId,
    pub text: String,
    pub completion: Completion,
}

/// Sends user text and streams the assistant answer back as deltas.
#[derive(Clone)]
pub struct TransportClient {
    sessions: Arc<SessionCoordinator>,
    opener: Arc<dyn ResponseStreamOpener>,
}

impl TransportClient {
    pub fn new(sessions: Arc<SessionCoordinator>, opener: Arc<dyn ResponseStreamOpener>) -> Self {
        Self { sessions, opener }
    }

    pub fn sessions(&self) -> &Arc<SessionCoordinator> {
        &self.sessions
    }

    /// Run one exchange, calling `on_delta` with each text fragment in arrival order.
    ///
    /// Blank input is rejected before any collaborator is called. Cancelling
    /// `cancel` stops the exchange at the next read; no delta is forwarded
    /// after that point.
    pub async fn send<F>(
        &self,
        text: &str,
        cancel: &CancellationToken,
        mut on_delta: F,
    ) -> Result<Reply, TransportError>
    where
        F: FnMut(&str),
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(TransportError::EmptyMessage);
        }

        let session_id = await_or_cancel(self.sessions.ensure(), cancel).await??;
        let stream = await_or_cancel(self.opener.open_response_stream(&session_id, text), cancel)
            .await?
            .map_err(|error| {
                warn!(%session_id, %error, "response stream request failed");
                TransportError::request_failed(&error)
            })?;
        debug!(%session_id, "response stream opened");

        drain_stream(session_id, stream, cancel, &mut on_delta).await
    }
}

impl fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportClient")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

async fn drain_stream<F>(
    session_id: SessionId,
    mut stream: ByteStream,
    cancel: &CancellationToken,
    on_delta: &mut F,
) -> Result<Reply, TransportError>
where
    F: FnMut(&str),
{
    let mut decoder = FrameDecoder::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(decoder.accumulated_text())),
            next = stream.next() => next,
        };
        let Some(chunk) = next else {
            break;
        };
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(error) => {
                warn!(%session_id, %error, "response stream interrupted");
                return Err(TransportError::StreamInterrupted {
                    detail: error.to_string(),
                    partial: decoder.into_text(),
                });
            }
        };

        let mut frames = decoder.feed(&chunk);
        loop {
            // Checked before pulling each frame so nothing is forwarded once cancelled.
            if cancel.is_cancelled() {
                return Err(cancelled(frames.accumulated_text()));
            }
            let Some(event) = frames.next() else {
                break;
            };

            match event {
                FrameEvent::Delta { text } => on_delta(&text),
                FrameEvent::Done => {
                    let text = frames.accumulated_text().to_owned();
                    info!(%session_id, chars = text.chars().count(), "exchange completed");
                    return Ok(Reply {
                        session_id,
                        text,
                        completion: Completion::Done,
                    });
                }
                FrameEvent::Error { detail } => {
                    let detail = detail.unwrap_or_else(|| "streaming error".to_owned());
                    warn!(%session_id, %detail, "stream reported an error");
                    return Err(TransportError::Stream {
                        detail,
                        partial: frames.accumulated_text().to_owned(),
                    });
                }
                FrameEvent::Other { kind, data } => {
                    debug!(%kind, len = data.len(), "ignoring frame");
                }
            }
        }
    }

    if !decoder.is_empty_buffer() {
        debug!(%session_id, "discarding incomplete trailing frame");
    }
    let text = decoder.into_text();
    info!(%session_id, chars = text.chars().count(), "stream closed without terminal frame");

    Ok(Reply {
        session_id,
        text,
        completion: Completion::Closed,
    })
}

fn cancelled(partial: &str) -> TransportError {
    debug!("exchange cancelled");
    TransportError::Cancelled {
        partial: partial.to_owned(),
    }
}

async fn await_or_cancel<F>(
    future: F,
    cancel: &CancellationToken,
) -> Result<F::Output, TransportError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancelled("")),
        output = future => Ok(output),
    }
}
