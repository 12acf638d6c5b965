use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One conversation message as exchanged with the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Empty assistant message, filled from deltas as they arrive.
    pub fn assistant() -> Self {
        Self::new(Role::Assistant, String::new())
    }

    pub fn append_delta(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn assistant_message_grows_from_deltas() {
        let mut message = Message::assistant();
        assert!(message.is_empty());
        message.append_delta("Hel");
        message.append_delta("lo");
        assert_eq!(message.content, "Hello");
        assert_eq!(message.role, Role::Assistant);
    }

    #[test]
    fn serializes_with_camel_case_timestamp() {
        let mut message = Message::user("hi");
        message.id = "m1".to_owned();
        message.created_at = OffsetDateTime::UNIX_EPOCH;

        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": "m1",
                "role": "user",
                "content": "hi",
                "createdAt": "1970-01-01T00:00:00Z"
            })
        );

        let decoded: Message = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded, message);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(Message::user("a").id, Message::user("a").id);
    }
}
