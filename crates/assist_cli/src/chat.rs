use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use assist_transport::{
    CancellationToken, Message, Reply, SessionId, TransportClient, TransportError,
};
use tracing::info;
use transcript_store::TranscriptStore;

pub const PROMPT: &str = "> ";

/// How one input line ended.
#[derive(Debug)]
pub enum Exchange {
    Replied(Reply),
    Failed(TransportError),
}

/// Drives exchanges for one terminal conversation and mirrors them to a transcript.
pub struct ChatSession<W> {
    client: TransportClient,
    out: W,
    transcript_root: Option<PathBuf>,
    transcript: Option<TranscriptStore>,
}

impl<W: Write> ChatSession<W> {
    pub fn new(client: TransportClient, out: W) -> Self {
        Self {
            client,
            out,
            transcript_root: None,
            transcript: None,
        }
    }

    /// Transcripts are created under `root` once the first exchange has a session.
    #[must_use]
    pub fn with_transcript_root(mut self, root: Option<PathBuf>) -> Self {
        self.transcript_root = root;
        self
    }

    pub fn transcript(&self) -> Option<&TranscriptStore> {
        self.transcript.as_ref()
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        self.out.write_all(PROMPT.as_bytes())?;
        self.out.flush()
    }

    pub fn print(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    pub fn session_summary(&self) -> String {
        let session = self
            .client
            .sessions()
            .cached()
            .map_or_else(|| "not started".to_string(), |id| id.to_string());
        match &self.transcript {
            Some(store) => format!("session: {session}\ntranscript: {}", store.path().display()),
            None => format!("session: {session}"),
        }
    }

    /// Sends `text`, echoing deltas as they arrive.
    ///
    /// Transport failures are reported to the output and returned as
    /// [`Exchange::Failed`]; only output and transcript I/O errors are `Err`.
    pub async fn exchange(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Exchange> {
        let question = Message::user(text.trim());
        let mut answer = Message::assistant();
        let mut write_error: Option<io::Error> = None;

        let out = &mut self.out;
        let result = self
            .client
            .send(text, cancel, |delta| {
                answer.append_delta(delta);
                if write_error.is_none() {
                    if let Err(error) = out.write_all(delta.as_bytes()).and_then(|()| out.flush())
                    {
                        write_error = Some(error);
                    }
                }
            })
            .await;

        if let Some(error) = write_error {
            return Err(error).context("failed to write reply");
        }

        match result {
            Ok(reply) => {
                writeln!(self.out).context("failed to write reply")?;
                let session_id = reply.session_id.clone();
                self.record(&session_id, question, Some(answer))?;
                Ok(Exchange::Replied(reply))
            }
            Err(error) => {
                let started = error.partial_text().is_some_and(|partial| !partial.is_empty());
                if started {
                    writeln!(self.out).context("failed to write reply")?;
                }
                self.print(&describe_failure(&error))
                    .context("failed to write reply")?;
                if error.is_cancelled() {
                    info!("exchange cancelled");
                }

                let sent = !matches!(error, TransportError::EmptyMessage);
                if let Some(session_id) = self.client.sessions().cached().filter(|_| sent) {
                    let answer = started.then_some(answer);
                    self.record(&session_id, question, answer)?;
                }
                Ok(Exchange::Failed(error))
            }
        }
    }

    fn record(
        &mut self,
        session_id: &SessionId,
        question: Message,
        answer: Option<Message>,
    ) -> anyhow::Result<()> {
        let Some(root) = self.transcript_root.as_deref() else {
            return Ok(());
        };
        if self.transcript.is_none() {
            let store = TranscriptStore::create_new(root, session_id)
                .context("failed to create transcript")?;
            self.transcript = Some(store);
        }
        let Some(store) = self.transcript.as_mut() else {
            return Ok(());
        };

        store
            .append(question)
            .context("failed to append to transcript")?;
        if let Some(answer) = answer {
            store
                .append(answer)
                .context("failed to append to transcript")?;
        }
        Ok(())
    }
}

/// One-line status shown after a failed exchange.
pub fn describe_failure(error: &TransportError) -> String {
    match error {
        TransportError::Cancelled { .. } => "[cancelled]".to_string(),
        other => format!("[error] {other}"),
    }
}
