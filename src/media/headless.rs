use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{ClientError, Result};
use crate::media::{JoinParams, MediaEngine, RemoteUser, TrackKind};

#[derive(Debug, Default)]
struct LocalState {
    joined: Option<JoinParams>,
    // kind -> enabled
    tracks: HashMap<TrackKind, bool>,
    published: HashSet<TrackKind>,
}

/// Media engine that moves no media.
///
/// Tracks what would be captured and published, and keeps a roster of remote
/// users fed by the `on_user_*` callbacks. Used by the terminal client and in
/// tests.
pub struct HeadlessMedia {
    local: RwLock<LocalState>,
    remote: DashMap<u32, RemoteUser>,
    screen_capture_allowed: bool,
}

impl HeadlessMedia {
    pub fn new() -> Self {
        Self {
            local: RwLock::new(LocalState::default()),
            remote: DashMap::new(),
            screen_capture_allowed: true,
        }
    }

    /// Engine whose screen capture is always refused, like a denied permission prompt
    pub fn without_screen_capture() -> Self {
        Self {
            screen_capture_allowed: false,
            ..Self::new()
        }
    }

    pub fn joined(&self) -> Option<JoinParams> {
        self.read(|state| state.joined.clone())
    }

    pub fn is_enabled(&self, kind: TrackKind) -> bool {
        self.read(|state| state.tracks.get(&kind).copied().unwrap_or(false))
    }

    // ==================== SDK callbacks ====================

    pub fn on_user_joined(&self, uid: u32) {
        self.remote.entry(uid).or_insert_with(|| RemoteUser::new(uid));
        tracing::debug!(uid, "Remote user joined");
    }

    pub fn on_user_published(&self, uid: u32, kind: TrackKind) {
        let mut user = self.remote.entry(uid).or_insert_with(|| RemoteUser::new(uid));
        set_remote_flag(&mut user, kind, true);
    }

    pub fn on_user_unpublished(&self, uid: u32, kind: TrackKind) {
        if let Some(mut user) = self.remote.get_mut(&uid) {
            set_remote_flag(&mut user, kind, false);
        }
    }

    pub fn on_user_left(&self, uid: u32) {
        self.remote.remove(&uid);
        tracing::debug!(uid, "Remote user left");
    }

    fn read<R>(&self, f: impl FnOnce(&LocalState) -> R) -> R {
        match self.local.read() {
            Ok(state) => f(&state),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write<R>(&self, f: impl FnOnce(&mut LocalState) -> R) -> R {
        match self.local.write() {
            Ok(mut state) => f(&mut state),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl Default for HeadlessMedia {
    fn default() -> Self {
        Self::new()
    }
}

fn set_remote_flag(user: &mut RemoteUser, kind: TrackKind, value: bool) {
    match kind {
        TrackKind::Microphone => user.has_audio = value,
        TrackKind::Camera => user.has_video = value,
        TrackKind::Screen => user.has_screen_share = value,
    }
}

#[async_trait]
impl MediaEngine for HeadlessMedia {
    async fn join(&self, params: &JoinParams) -> Result<()> {
        if !params.is_ready() {
            return Err(ClientError::Media("Incomplete join parameters".to_string()));
        }
        self.write(|state| state.joined = Some(params.clone()));
        tracing::info!(channel = %params.channel, uid = params.uid, "Joined media channel");
        Ok(())
    }

    async fn leave(&self) -> Result<()> {
        self.write(|state| {
            state.joined = None;
            state.published.clear();
            state.tracks.clear();
        });
        self.remote.clear();
        tracing::info!("Left media channel");
        Ok(())
    }

    async fn create_track(&self, kind: TrackKind) -> Result<()> {
        if kind == TrackKind::Screen && !self.screen_capture_allowed {
            return Err(ClientError::Media("Screen capture permission denied".to_string()));
        }
        self.write(|state| {
            state.tracks.entry(kind).or_insert(true);
        });
        Ok(())
    }

    async fn close_track(&self, kind: TrackKind) -> Result<()> {
        self.write(|state| {
            state.published.remove(&kind);
            state.tracks.remove(&kind);
        });
        Ok(())
    }

    async fn set_enabled(&self, kind: TrackKind, enabled: bool) -> Result<()> {
        self.write(|state| match state.tracks.get_mut(&kind) {
            Some(flag) => {
                *flag = enabled;
                Ok(())
            }
            None => Err(ClientError::Media(format!("No local {:?} track", kind))),
        })
    }

    async fn publish(&self, kind: TrackKind) -> Result<()> {
        self.write(|state| {
            if state.joined.is_none() {
                return Err(ClientError::Media("Not joined to a channel".to_string()));
            }
            if !state.tracks.contains_key(&kind) {
                return Err(ClientError::Media(format!("No local {:?} track", kind)));
            }
            state.published.insert(kind);
            Ok(())
        })
    }

    async fn unpublish(&self, kind: TrackKind) -> Result<()> {
        self.write(|state| {
            state.published.remove(&kind);
        });
        Ok(())
    }

    fn has_track(&self, kind: TrackKind) -> bool {
        self.read(|state| state.tracks.contains_key(&kind))
    }

    fn published(&self) -> Vec<TrackKind> {
        self.read(|state| state.published.iter().copied().collect())
    }

    fn remote_users(&self) -> Vec<RemoteUser> {
        let mut users: Vec<RemoteUser> = self.remote.iter().map(|r| r.value().clone()).collect();
        users.sort_by_key(|u| u.uid);
        users
    }
}
