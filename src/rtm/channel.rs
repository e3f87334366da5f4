use async_trait::async_trait;

use crate::error::Result;
use crate::transport::{connect_text_link, with_query, TextLink};

/// Credentials for joining one signaling channel
#[derive(Debug, Clone)]
pub struct RtmLogin {
    pub app_id: String,
    pub uid: String,
    pub token: String,
    pub channel: String,
}

/// Seam to the signaling service: log in and join a channel, yielding a text link
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    async fn join(&self, login: &RtmLogin) -> Result<TextLink>;
}

/// Signaling over a plain WebSocket endpoint.
///
/// Connects to `{url}?appId=..&channel=..&uid=..&token=..`; every text frame
/// is one serialized event.
pub struct WsSignaling {
    url: String,
}

impl WsSignaling {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn endpoint(&self, login: &RtmLogin) -> Result<String> {
        with_query(
            &self.url,
            &[
                ("appId", login.app_id.as_str()),
                ("channel", login.channel.as_str()),
                ("uid", login.uid.as_str()),
                ("token", login.token.as_str()),
            ],
        )
    }
}

#[async_trait]
impl SignalingConnector for WsSignaling {
    async fn join(&self, login: &RtmLogin) -> Result<TextLink> {
        let url = self.endpoint(login)?;
        tracing::debug!(channel = %login.channel, uid = %login.uid, "Joining signaling channel");
        connect_text_link(&url).await
    }
}
