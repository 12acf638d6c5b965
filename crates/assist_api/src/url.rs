use assist_transport::SessionId;
use reqwest::Url;

use crate::error::AssistApiError;

/// Default base URL for assistant API requests.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_SESSION_PATH: &str = "/auth/service/session/create";
pub const DEFAULT_STREAM_PATH: &str = "/api/chats/{session_id}/stream";
pub const DEFAULT_COMPLETION_PATH: &str = "/api/chats/{session_id}/messages";

/// Placeholder replaced with the session identifier in endpoint templates.
pub const SESSION_PLACEHOLDER: &str = "{session_id}";

/// Resolve an endpoint path against `base_url`.
///
/// Rules:
/// 1) an empty base falls back to [`DEFAULT_BASE_URL`]
/// 2) the base path is kept, so `https://host/vox` + `/api/x` is `https://host/vox/api/x`
/// 3) `{session_id}` is replaced (percent-encoded) when `session_id` is given
pub fn resolve_endpoint(
    base_url: &str,
    path: &str,
    session_id: Option<&SessionId>,
) -> Result<Url, AssistApiError> {
    let base = if base_url.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        base_url.trim()
    };

    let parsed = Url::parse(base).map_err(|error| {
        AssistApiError::InvalidBaseUrl(format!("{base}: {error}"))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
        return Err(AssistApiError::InvalidBaseUrl(base.to_owned()));
    }

    let mut path = path.trim().to_owned();
    if path.contains(SESSION_PLACEHOLDER) {
        let session_id = session_id.ok_or_else(|| {
            AssistApiError::UrlResolution(format!("'{path}' needs a session id"))
        })?;
        path = path.replace(SESSION_PLACEHOLDER, &encode_segment(&session_id.to_string()));
    }

    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|error| AssistApiError::UrlResolution(format!("{joined}: {error}")))
}

fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
