use serde::{Deserialize, Serialize};

/// Envelope for every chat transport frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ChatFrame {
    pub fn new(event: &str, data: serde_json::Value) -> Self {
        Self {
            event: event.to_string(),
            data,
        }
    }
}

/// sendMessage payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_name: String,
    pub message: String,
    pub author_id: String,
}

/// Chat event names
pub mod chat_events {
    // Client -> Server
    pub const JOIN_ROOM: &str = "joinRoom";
    pub const LEAVE_ROOM: &str = "leaveRoom";
    pub const SEND_MESSAGE: &str = "sendMessage";

    // Server -> Client
    pub const NEW_MESSAGE: &str = "newMessage";
}
