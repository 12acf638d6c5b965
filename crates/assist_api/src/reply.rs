//! Reply text extraction for non-streaming completions.
//!
//! The completion response shape is not fixed; the reply is taken from the
//! first field that carries non-blank text.

use serde_json::Value;

/// Fields checked, in order, for the reply text.
pub const REPLY_FIELDS: [&str; 4] = ["answer", "message", "content", "response_text"];
/// Envelope some deployments wrap the reply in.
pub const REPLY_ENVELOPE: &str = "data";
/// Maximum characters kept when falling back to the serialized response.
pub const FALLBACK_REPLY_CHARS: usize = 500;

pub fn extract_reply(response: &Value) -> String {
    if let Some(text) = reply_field(response) {
        return text;
    }

    match response.get(REPLY_ENVELOPE) {
        Some(Value::String(text)) if !text.trim().is_empty() => return text.clone(),
        Some(envelope) => {
            if let Some(text) = reply_field(envelope) {
                return text;
            }
        }
        None => {}
    }

    let serialized = match response {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    serialized.chars().take(FALLBACK_REPLY_CHARS).collect()
}

fn reply_field(value: &Value) -> Option<String> {
    REPLY_FIELDS.iter().find_map(|field| {
        value
            .get(field)
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_owned)
    })
}
