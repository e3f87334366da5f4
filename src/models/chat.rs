use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAuthor {
    pub id: String,
    pub name: String,
}

/// Chat message broadcast by the chat transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<ChatAuthor>,
}

impl ChatMessage {
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(|a| a.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_message() {
        let json = r#"{
            "id": "m1",
            "content": "hello",
            "createdAt": "2025-01-01T10:00:00.000Z",
            "author": { "id": "u1", "name": "Alice" }
        }"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.author_name(), "Alice");
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn test_missing_author_falls_back() {
        let json = r#"{"id":"m2","content":"hi","createdAt":"2025-01-01T10:00:00Z"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.author_name(), "User");
    }
}
