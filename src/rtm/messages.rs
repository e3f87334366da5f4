use serde::{Deserialize, Serialize};

/// Events multiplexed over the room's signaling channel.
///
/// Encoded as JSON text with a `type` tag, e.g.
/// `{"type":"reaction","emoji":"👍","fromName":"Alice"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RtmEvent {
    #[serde(rename = "reaction")]
    Reaction(ReactionEvent),
    #[serde(rename = "raise-hand")]
    RaiseHand(RaiseHandEvent),
    #[serde(rename = "tldraw-event")]
    Whiteboard(WhiteboardEvent),
}

impl RtmEvent {
    pub fn reaction(emoji: impl Into<String>, from_name: impl Into<String>) -> Self {
        RtmEvent::Reaction(ReactionEvent {
            emoji: emoji.into(),
            from_name: from_name.into(),
        })
    }

    pub fn raise_hand(user_id: impl Into<String>, is_raised: bool) -> Self {
        RtmEvent::RaiseHand(RaiseHandEvent {
            user_id: user_id.into(),
            is_raised,
        })
    }

    pub fn whiteboard(data: serde_json::Value) -> Self {
        RtmEvent::Whiteboard(WhiteboardEvent { data })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RtmEvent::Reaction(_) => event_types::REACTION,
            RtmEvent::RaiseHand(_) => event_types::RAISE_HAND,
            RtmEvent::Whiteboard(_) => event_types::WHITEBOARD,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Emoji reaction from a participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub emoji: String,
    #[serde(rename = "fromName")]
    pub from_name: String,
}

/// Raise-hand toggle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaiseHandEvent {
    pub user_id: String,
    pub is_raised: bool,
}

/// Whiteboard delta, opaque at this layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiteboardEvent {
    pub data: serde_json::Value,
}

/// Wire tags
pub mod event_types {
    pub const REACTION: &str = "reaction";
    pub const RAISE_HAND: &str = "raise-hand";
    pub const WHITEBOARD: &str = "tldraw-event";
}
