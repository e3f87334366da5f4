use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::api::BackendApi;
use crate::auth::SessionManager;
use crate::error::Result;
use crate::rtm::{
    EventBuffer, RaiseHandEvent, ReactionEvent, RtmEvent, RtmLogin, SignalingConnector,
    WhiteboardEvent,
};
use crate::transport::TextLink;

/// Per-type event logs fed by the receive loop
#[derive(Clone, Default)]
pub struct RtmBuffers {
    pub reactions: EventBuffer<ReactionEvent>,
    pub raise_hands: EventBuffer<RaiseHandEvent>,
    pub whiteboard: EventBuffer<WhiteboardEvent>,
}

impl RtmBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one frame and append it to its buffer. Malformed frames are dropped.
    pub fn dispatch(&self, text: &str) -> Option<&'static str> {
        let event = match RtmEvent::decode(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse RTM message");
                return None;
            }
        };

        let kind = event.kind();
        tracing::trace!(kind, "RTM event received");

        match event {
            RtmEvent::Reaction(reaction) => self.reactions.push(reaction),
            RtmEvent::RaiseHand(hand) => self.raise_hands.push(hand),
            RtmEvent::Whiteboard(delta) => self.whiteboard.push(delta),
        }
        Some(kind)
    }
}

/// One signaling channel per room, shared by reactions, raised hands and the
/// whiteboard.
///
/// Connection state is binary. A dropped channel is not re-established; the
/// owner has to build a new multiplexer.
pub struct RtmMultiplexer {
    channel: String,
    connected: Arc<AtomicBool>,
    outgoing: Mutex<Option<mpsc::UnboundedSender<String>>>,
    recv_task: Mutex<Option<JoinHandle<()>>>,
    buffers: RtmBuffers,
}

impl RtmMultiplexer {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            connected: Arc::new(AtomicBool::new(false)),
            outgoing: Mutex::new(None),
            recv_task: Mutex::new(None),
            buffers: RtmBuffers::new(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn buffers(&self) -> &RtmBuffers {
        &self.buffers
    }

    pub fn reactions(&self) -> &EventBuffer<ReactionEvent> {
        &self.buffers.reactions
    }

    pub fn raise_hands(&self) -> &EventBuffer<RaiseHandEvent> {
        &self.buffers.raise_hands
    }

    pub fn whiteboard(&self) -> &EventBuffer<WhiteboardEvent> {
        &self.buffers.whiteboard
    }

    /// Fetch a signaling token for the logged-in user and join the channel.
    ///
    /// Returns whether the channel is now connected; failures are logged.
    pub async fn connect_with_backend(
        &self,
        api: &BackendApi,
        session: &SessionManager,
        connector: &dyn SignalingConnector,
        app_id: &str,
    ) -> bool {
        if let Err(e) = session.ensure_fresh().await {
            tracing::debug!(channel = %self.channel, error = %e, "No usable session, signaling not started");
            return false;
        }
        let (user, auth_token) = match session.credentials().await {
            Ok(credentials) => credentials,
            Err(_) => {
                tracing::debug!(channel = %self.channel, "No session, signaling not started");
                return false;
            }
        };
        if self.channel.is_empty() {
            return false;
        }

        let result = async {
            let rtm_token = api.rtm_token(&auth_token).await?;
            self.connect(
                connector,
                RtmLogin {
                    app_id: app_id.to_string(),
                    uid: user.id.clone(),
                    token: rtm_token,
                    channel: self.channel.clone(),
                },
            )
            .await
        }
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(channel = %self.channel, error = %e, "RTM initialization failed");
                false
            }
        }
    }

    /// Join with explicit credentials and start the receive loop
    pub async fn connect(&self, connector: &dyn SignalingConnector, login: RtmLogin) -> Result<()> {
        let TextLink {
            outgoing,
            mut incoming,
        } = connector.join(&login).await?;

        *self.outgoing.lock().await = Some(outgoing);
        self.connected.store(true, Ordering::SeqCst);

        let buffers = self.buffers.clone();
        let connected = self.connected.clone();
        let channel = self.channel.clone();
        let task = tokio::spawn(async move {
            while let Some(text) = incoming.recv().await {
                buffers.dispatch(&text);
            }
            connected.store(false, Ordering::SeqCst);
            tracing::warn!(channel = %channel, "Signaling channel closed");
        });

        if let Some(previous) = self.recv_task.lock().await.replace(task) {
            previous.abort();
        }

        tracing::info!(channel = %self.channel, uid = %login.uid, "RTM connected");
        Ok(())
    }

    /// Serialize and write one event. Nothing is sent while disconnected and
    /// failed writes are logged, not retried.
    ///
    /// Returns whether a write was attempted.
    pub async fn send(&self, event: &RtmEvent) -> bool {
        if !self.is_connected() {
            tracing::debug!(kind = event.kind(), "RTM not connected, dropping event");
            return false;
        }

        let payload = match event.encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode RTM event");
                return false;
            }
        };

        let outgoing = self.outgoing.lock().await;
        match outgoing.as_ref() {
            Some(tx) => {
                if let Err(e) = tx.send(payload) {
                    tracing::error!(error = %e, "RTM send message failed");
                }
                true
            }
            None => false,
        }
    }

    /// Leave the channel and stop the receive loop
    pub async fn disconnect(&self) {
        if let Some(task) = self.recv_task.lock().await.take() {
            task.abort();
        }
        self.outgoing.lock().await.take();
        if self.connected.swap(false, Ordering::SeqCst) {
            tracing::info!(channel = %self.channel, "RTM disconnected");
        }
    }
}

impl Drop for RtmMultiplexer {
    fn drop(&mut self) {
        if let Some(task) = self.recv_task.get_mut().take() {
            task.abort();
        }
    }
}
