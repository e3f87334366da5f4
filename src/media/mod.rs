//! Seam to the external real-time media SDK.
//!
//! Transport, codecs and congestion control live behind [`MediaEngine`];
//! this crate only decides what to publish and when.

pub mod headless;

pub use headless::HeadlessMedia;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Local track kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Microphone,
    Camera,
    Screen,
}

/// Peer as reported by the media SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    pub uid: u32,
    pub has_audio: bool,
    pub has_video: bool,
    pub has_screen_share: bool,
}

impl RemoteUser {
    pub fn new(uid: u32) -> Self {
        Self {
            uid,
            has_audio: false,
            has_video: false,
            has_screen_share: false,
        }
    }
}

/// Parameters for joining a media channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinParams {
    pub app_id: String,
    pub channel: String,
    pub token: String,
    pub uid: u32,
}

impl JoinParams {
    /// The SDK is only asked to join once every field is usable
    pub fn is_ready(&self) -> bool {
        !self.app_id.is_empty() && !self.token.is_empty() && !self.channel.is_empty() && self.uid > 0
    }
}

#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn join(&self, params: &JoinParams) -> Result<()>;
    async fn leave(&self) -> Result<()>;

    /// Acquire a local track (device or screen capture)
    async fn create_track(&self, kind: TrackKind) -> Result<()>;
    /// Stop and release a local track, unpublishing it first if needed
    async fn close_track(&self, kind: TrackKind) -> Result<()>;
    /// Mute/unmute without unpublishing
    async fn set_enabled(&self, kind: TrackKind, enabled: bool) -> Result<()>;

    async fn publish(&self, kind: TrackKind) -> Result<()>;
    async fn unpublish(&self, kind: TrackKind) -> Result<()>;

    fn has_track(&self, kind: TrackKind) -> bool;
    fn published(&self) -> Vec<TrackKind>;
    fn remote_users(&self) -> Vec<RemoteUser>;

    fn is_published(&self, kind: TrackKind) -> bool {
        self.published().contains(&kind)
    }
}

/// Integer media uid derived from the account id.
///
/// 32-bit rolling hash `h = h * 31 + unit` over UTF-16 code units, then the
/// absolute value. Zero means "no uid" and blocks joining.
pub fn media_uid(user_id: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in user_id.encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit));
    }
    hash.unsigned_abs()
}
