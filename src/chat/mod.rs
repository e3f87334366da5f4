//! In-room chat over its own transport connection.

pub mod messages;

pub use messages::{chat_events, ChatFrame, SendMessagePayload};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{ClientError, Result};
use crate::models::{ChatMessage, RoomName, User};
use crate::rtm::{BufferCursor, EventBuffer};
use crate::transport::{connect_text_link, TextLink};

/// Seam to the chat service
#[async_trait]
pub trait ChatConnector: Send + Sync {
    async fn connect(&self) -> Result<TextLink>;
}

/// Chat service reached over a WebSocket
pub struct WsChat {
    url: String,
}

impl WsChat {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl ChatConnector for WsChat {
    async fn connect(&self) -> Result<TextLink> {
        connect_text_link(&self.url)
            .await
            .map_err(|e| ClientError::Chat(e.to_string()))
    }
}

/// Live chat for one room. Messages are kept in arrival order for the
/// lifetime of the connection only.
pub struct ChatRoom {
    room: RoomName,
    user: User,
    outgoing: Option<mpsc::UnboundedSender<String>>,
    connected: Arc<AtomicBool>,
    messages: EventBuffer<ChatMessage>,
    recv_task: Option<JoinHandle<()>>,
    draft: String,
}

impl ChatRoom {
    /// Connect and announce ourselves with `joinRoom`
    pub async fn open(connector: &dyn ChatConnector, room: RoomName, user: User) -> Result<Self> {
        let TextLink {
            outgoing,
            mut incoming,
        } = connector.connect().await?;

        let join = ChatFrame::new(
            chat_events::JOIN_ROOM,
            serde_json::Value::String(room.to_string()),
        );
        outgoing
            .send(serde_json::to_string(&join)?)
            .map_err(|_| ClientError::Chat("Chat connection closed".to_string()))?;

        let connected = Arc::new(AtomicBool::new(true));
        let messages = EventBuffer::new();

        let task = {
            let connected = connected.clone();
            let messages = messages.clone();
            let room = room.clone();
            tokio::spawn(async move {
                while let Some(text) = incoming.recv().await {
                    handle_frame(&text, &messages);
                }
                connected.store(false, Ordering::SeqCst);
                tracing::info!(room = %room, "Chat disconnected");
            })
        };

        tracing::info!(room = %room, user_id = %user.id, "Chat connected");

        Ok(Self {
            room,
            user,
            outgoing: Some(outgoing),
            connected,
            messages,
            recv_task: Some(task),
            draft: String::new(),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.outgoing.is_some()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Send the current draft, clearing it on success
    pub fn send_draft(&mut self) -> bool {
        let text = std::mem::take(&mut self.draft);
        if self.send(&text) {
            true
        } else {
            self.draft = text;
            false
        }
    }

    /// Broadcast a message. Blank input is ignored.
    pub fn send(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || !self.is_connected() {
            return false;
        }

        let payload = SendMessagePayload {
            room_name: self.room.to_string(),
            message: text.to_string(),
            author_id: self.user.id.clone(),
        };
        let frame = match serde_json::to_value(&payload)
            .and_then(|data| serde_json::to_string(&ChatFrame::new(chat_events::SEND_MESSAGE, data)))
        {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode chat message");
                return false;
            }
        };

        match self.outgoing.as_ref().map(|tx| tx.send(frame)) {
            Some(Ok(())) => true,
            _ => {
                tracing::error!(room = %self.room, "Chat send failed");
                false
            }
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.snapshot()
    }

    /// Cursor over incoming messages, for rendering new ones as they arrive
    pub fn subscribe(&self) -> BufferCursor<ChatMessage> {
        self.messages.cursor()
    }

    /// Leave the room and drop the connection
    pub fn close(&mut self) {
        if self.is_connected() {
            if let Some(tx) = self.outgoing.as_ref() {
                let leave = ChatFrame::new(
                    chat_events::LEAVE_ROOM,
                    serde_json::Value::String(self.room.to_string()),
                );
                if let Ok(text) = serde_json::to_string(&leave) {
                    let _ = tx.send(text);
                }
            }
        }
        self.outgoing = None;
        if let Some(task) = self.recv_task.take() {
            task.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Drop for ChatRoom {
    fn drop(&mut self) {
        self.close();
    }
}

fn handle_frame(text: &str, messages: &EventBuffer<ChatMessage>) {
    let frame: ChatFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed chat frame");
            return;
        }
    };

    match frame.event.as_str() {
        chat_events::NEW_MESSAGE => match serde_json::from_value::<ChatMessage>(frame.data) {
            Ok(message) => messages.push(message),
            Err(e) => tracing::warn!(error = %e, "Malformed chat message"),
        },
        other => {
            tracing::debug!(event = %other, "Ignoring chat event");
        }
    }
}
