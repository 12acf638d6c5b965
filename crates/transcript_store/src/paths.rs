use assist_transport::SessionId;

pub const TRANSCRIPT_EXTENSION: &str = "jsonl";

/// Replaces characters that are awkward or invalid in file names.
#[must_use]
pub fn sanitize_for_filename(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            ':' | '/' | '\\' | ' ' => '-',
            _ => c,
        })
        .collect()
}

/// `<created_at>_<session_id>.jsonl`, so names sort by creation time.
#[must_use]
pub fn transcript_file_name(created_at: &str, session_id: &SessionId) -> String {
    format!(
        "{}_{}.{TRANSCRIPT_EXTENSION}",
        sanitize_for_filename(created_at),
        sanitize_for_filename(&session_id.to_string())
    )
}
