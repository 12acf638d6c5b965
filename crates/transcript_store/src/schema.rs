use assist_transport::{Role, SessionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptRecordType {
    Transcript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRecordType {
    Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptHeader {
    #[serde(rename = "type")]
    pub record_type: TranscriptRecordType,
    pub version: u32,
    pub session_id: SessionId,
    pub created_at: String,
}

impl TranscriptHeader {
    #[must_use]
    pub fn v1(session_id: SessionId, created_at: impl Into<String>) -> Self {
        Self {
            record_type: TranscriptRecordType::Transcript,
            version: 1,
            session_id,
            created_at: created_at.into(),
        }
    }
}

/// On-disk form of a message. The timestamp stays textual so a bad value is
/// reported with its line instead of as a generic parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageRecord {
    #[serde(rename = "type")]
    pub record_type: MessageRecordType,
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

pub(crate) enum JsonLine {
    Header(TranscriptHeader),
    Message(MessageRecord),
}
