//! Append-only JSONL transcripts of assistant conversations.
//!
//! Each file holds one conversation: a `transcript` header line followed by
//! one `message` line per stored [`Message`](assist_transport::Message).

mod error;
mod paths;
mod schema;
mod store;

pub use error::TranscriptStoreError;
pub use paths::{sanitize_for_filename, transcript_file_name, TRANSCRIPT_EXTENSION};
pub use schema::{MessageRecord, MessageRecordType, TranscriptHeader, TranscriptRecordType};
pub use store::TranscriptStore;
