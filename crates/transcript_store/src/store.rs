use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use assist_transport::{Message, SessionId};
use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::error::TranscriptStoreError;
use crate::paths::{transcript_file_name, TRANSCRIPT_EXTENSION};
use crate::schema::{JsonLine, MessageRecord, MessageRecordType, TranscriptHeader};

/// One open transcript file. Reads validate every line; writes append and flush.
#[derive(Debug)]
pub struct TranscriptStore {
    path: PathBuf,
    file: File,
    header: TranscriptHeader,
    messages: Vec<Message>,
    ids: HashSet<String>,
}

impl TranscriptStore {
    /// Creates `<root>/<created_at>_<session_id>.jsonl` and writes its header.
    pub fn create_new(root: &Path, session_id: &SessionId) -> Result<Self, TranscriptStoreError> {
        fs::create_dir_all(root)
            .map_err(|source| TranscriptStoreError::io("creating transcript root", root, source))?;

        let now = OffsetDateTime::now_utc();
        let now = now - Duration::nanoseconds(i64::from(now.nanosecond()));
        let created_at = now
            .format(&Rfc3339)
            .map_err(TranscriptStoreError::ClockFormat)?;
        let header = TranscriptHeader::v1(session_id.clone(), created_at);
        let path = root.join(transcript_file_name(&header.created_at, session_id));

        let mut file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .map_err(|source| {
                TranscriptStoreError::io("creating transcript file", &path, source)
            })?;
        write_json_line(&mut file, &path, &header)?;
        debug!(path = %path.display(), session_id = %session_id, "created transcript");

        Ok(Self {
            path,
            file,
            header,
            messages: Vec::new(),
            ids: HashSet::new(),
        })
    }

    pub fn open(path: &Path) -> Result<Self, TranscriptStoreError> {
        let path = path.to_path_buf();
        let read_file = File::open(&path)
            .map_err(|source| TranscriptStoreError::io("opening transcript file", &path, source))?;
        let reader = BufReader::new(read_file);

        let mut header: Option<TranscriptHeader> = None;
        let mut messages = Vec::new();
        let mut ids = HashSet::new();

        for (line_index, line_result) in reader.lines().enumerate() {
            let line_number = line_index + 1;
            let line = line_result
                .map_err(|source| TranscriptStoreError::io_line(&path, line_number, source))?;
            let parsed = parse_json_line(&path, line_number, &line)?;

            if line_number == 1 {
                match parsed {
                    JsonLine::Header(parsed_header) => {
                        validate_header_line(&path, line_number, &parsed_header)?;
                        header = Some(parsed_header);
                    }
                    JsonLine::Message(_) => {
                        return Err(TranscriptStoreError::InvalidHeaderRecord {
                            path,
                            line: line_number,
                        });
                    }
                }

                continue;
            }

            match parsed {
                JsonLine::Header(_) => {
                    return Err(TranscriptStoreError::InvalidMessageRecord {
                        path,
                        line: line_number,
                    });
                }
                JsonLine::Message(record) => {
                    let message = message_from_record(&path, line_number, record)?;
                    if !ids.insert(message.id.clone()) {
                        return Err(TranscriptStoreError::DuplicateMessageId {
                            path,
                            line: line_number,
                            id: message.id,
                        });
                    }
                    messages.push(message);
                }
            }
        }

        let header =
            header.ok_or_else(|| TranscriptStoreError::MissingHeader { path: path.clone() })?;

        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|source| {
                TranscriptStoreError::io("opening transcript file for append", &path, source)
            })?;

        Ok(Self {
            path,
            file,
            header,
            messages,
            ids,
        })
    }

    /// Opens the newest transcript under `root`.
    pub fn open_latest(root: &Path) -> Result<Self, TranscriptStoreError> {
        let path = Self::latest_in(root)?;
        Self::open(&path)
    }

    /// Writes `message` as one line and flushes before recording it in memory.
    pub fn append(&mut self, message: Message) -> Result<(), TranscriptStoreError> {
        if self.ids.contains(&message.id) {
            return Err(TranscriptStoreError::DuplicateMessageId {
                path: self.path.clone(),
                line: self.messages.len() + 2,
                id: message.id,
            });
        }

        let record = record_from_message(&message)?;
        write_json_line(&mut self.file, &self.path, &record)?;

        self.ids.insert(message.id.clone());
        self.messages.push(message);
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self) -> &TranscriptHeader {
        &self.header
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.header.session_id
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Path of the newest `.jsonl` file directly under `root`, by file name.
    pub fn latest_in(root: &Path) -> Result<PathBuf, TranscriptStoreError> {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Err(TranscriptStoreError::NoTranscriptsFound {
                    root: root.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(TranscriptStoreError::io(
                    "listing transcript root",
                    root,
                    source,
                ));
            }
        };

        let mut latest: Option<PathBuf> = None;
        for entry in entries {
            let entry = entry.map_err(|source| {
                TranscriptStoreError::io("listing transcript root", root, source)
            })?;
            let path = entry.path();
            let is_transcript = path.is_file()
                && path
                    .extension()
                    .is_some_and(|extension| extension == TRANSCRIPT_EXTENSION);
            if !is_transcript {
                continue;
            }
            match &latest {
                Some(current) if current.file_name() >= path.file_name() => {}
                _ => latest = Some(path),
            }
        }

        latest.ok_or_else(|| TranscriptStoreError::NoTranscriptsFound {
            root: root.to_path_buf(),
        })
    }
}

fn write_json_line<T: Serialize>(
    file: &mut File,
    path: &Path,
    record: &T,
) -> Result<(), TranscriptStoreError> {
    let mut line = serde_json::to_string(record)
        .map_err(|source| TranscriptStoreError::json_serialize(path, source))?;
    line.push('\n');
    file.write_all(line.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|source| TranscriptStoreError::io("appending transcript line", path, source))
}

pub(crate) fn parse_json_line(
    path: &Path,
    line_number: usize,
    line: &str,
) -> Result<JsonLine, TranscriptStoreError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|source| TranscriptStoreError::json_line(path, line_number, source))?;

    let kind = match value.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(other) => other.to_string(),
        None => "<missing>".to_owned(),
    };

    let parsed = if kind == "transcript" {
        serde_json::from_value(value).map(JsonLine::Header)
    } else if kind == "message" {
        serde_json::from_value(value).map(JsonLine::Message)
    } else {
        return Err(TranscriptStoreError::UnknownRecordType {
            path: path.to_path_buf(),
            line: line_number,
            found: kind,
        });
    };

    parsed.map_err(|source| TranscriptStoreError::json_line(path, line_number, source))
}

pub(crate) fn validate_header_line(
    path: &Path,
    line_number: usize,
    header: &TranscriptHeader,
) -> Result<(), TranscriptStoreError> {
    if header.version != 1 {
        return Err(TranscriptStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            line: line_number,
            found: header.version,
        });
    }

    parse_rfc3339(path, line_number, "created_at", &header.created_at)?;
    Ok(())
}

fn message_from_record(
    path: &Path,
    line_number: usize,
    record: MessageRecord,
) -> Result<Message, TranscriptStoreError> {
    let created_at = parse_rfc3339(path, line_number, "createdAt", &record.created_at)?;
    Ok(Message {
        id: record.id,
        role: record.role,
        content: record.content,
        created_at,
    })
}

fn record_from_message(message: &Message) -> Result<MessageRecord, TranscriptStoreError> {
    let created_at = message
        .created_at
        .format(&Rfc3339)
        .map_err(TranscriptStoreError::ClockFormat)?;
    Ok(MessageRecord {
        record_type: MessageRecordType::Message,
        id: message.id.clone(),
        role: message.role,
        content: message.content.clone(),
        created_at,
    })
}

pub(crate) fn parse_rfc3339(
    path: &Path,
    line_number: usize,
    field: &'static str,
    value: &str,
) -> Result<OffsetDateTime, TranscriptStoreError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|_| TranscriptStoreError::InvalidTimestamp {
        path: path.to_path_buf(),
        line: line_number,
        field,
        value: value.to_string(),
    })
}
