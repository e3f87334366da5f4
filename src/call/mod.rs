//! In-call state: local media controls, panels, reactions, raised hands and
//! the participant roster layered over the media engine and the signaling
//! multiplexer.

pub mod hands;
pub mod participants;
pub mod reactions;
pub mod screen_share;

pub use hands::RaisedHands;
pub use participants::{
    build_roster, layout, main_stage, LocalMedia, MainStage, Participant, VideoLayout,
};
pub use reactions::{FloatingReaction, ReactionBoard};
pub use screen_share::{start_screen_share, stop_screen_share, SCREEN_SHARE_DENIED};

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::media::{media_uid, JoinParams, MediaEngine, TrackKind};
use crate::models::{RoomName, User};
use crate::routing::{Navigator, Route};
use crate::rtm::{BufferCursor, RaiseHandEvent, ReactionEvent, RtmEvent, RtmMultiplexer};

/// Side panel next to the video grid; chat and participants exclude each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidePanel {
    None,
    Chat,
    Participants,
}

/// Everything needed to enter a call
pub struct CallSetup {
    pub room: RoomName,
    pub user: User,
    pub app_id: String,
    pub media_token: String,
    pub reaction_ttl: Duration,
}

pub struct CallSession {
    room: RoomName,
    user: User,
    app_id: String,
    media_token: String,
    media: Arc<dyn MediaEngine>,
    rtm: Arc<RtmMultiplexer>,
    navigator: Navigator,

    mic_on: bool,
    camera_on: bool,
    screen_sharing: bool,
    panel: SidePanel,
    whiteboard_open: bool,

    reactions: ReactionBoard,
    hands: RaisedHands,
    reaction_cursor: BufferCursor<ReactionEvent>,
    hand_cursor: BufferCursor<RaiseHandEvent>,
}

impl CallSession {
    pub fn new(
        setup: CallSetup,
        media: Arc<dyn MediaEngine>,
        rtm: Arc<RtmMultiplexer>,
        navigator: Navigator,
    ) -> Self {
        let reaction_cursor = rtm.reactions().cursor();
        let hand_cursor = rtm.raise_hands().cursor();

        Self {
            room: setup.room,
            user: setup.user,
            app_id: setup.app_id,
            media_token: setup.media_token,
            media,
            rtm,
            navigator,
            mic_on: true,
            camera_on: true,
            screen_sharing: false,
            panel: SidePanel::None,
            whiteboard_open: false,
            reactions: ReactionBoard::new(setup.reaction_ttl),
            hands: RaisedHands::new(),
            reaction_cursor,
            hand_cursor,
        }
    }

    pub fn room(&self) -> &RoomName {
        &self.room
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn uid(&self) -> u32 {
        media_uid(&self.user.id)
    }

    pub fn rtm(&self) -> &Arc<RtmMultiplexer> {
        &self.rtm
    }

    /// Acquire microphone and camera, join the media channel and publish both.
    ///
    /// Joining is skipped while the uid or token are unusable.
    pub async fn join(&mut self) -> Result<bool> {
        for kind in [TrackKind::Microphone, TrackKind::Camera] {
            if let Err(e) = self.media.create_track(kind).await {
                tracing::warn!(track = ?kind, error = %e, "Local track unavailable");
            }
        }

        let params = JoinParams {
            app_id: self.app_id.clone(),
            channel: self.room.to_string(),
            token: self.media_token.clone(),
            uid: self.uid(),
        };
        if !params.is_ready() {
            tracing::warn!(room = %self.room, uid = params.uid, "Join parameters incomplete, not joining");
            return Ok(false);
        }

        self.media.join(&params).await?;
        for kind in [TrackKind::Microphone, TrackKind::Camera] {
            if self.media.has_track(kind) {
                self.media.publish(kind).await?;
            }
        }

        tracing::info!(room = %self.room, uid = params.uid, "Joined call");
        Ok(true)
    }

    // ==================== Controls ====================

    pub async fn toggle_mic(&mut self) -> bool {
        self.mic_on = !self.mic_on;
        if let Err(e) = self.media.set_enabled(TrackKind::Microphone, self.mic_on).await {
            tracing::warn!(error = %e, "Failed to toggle microphone");
        }
        self.mic_on
    }

    pub async fn toggle_camera(&mut self) -> bool {
        self.camera_on = !self.camera_on;
        if let Err(e) = self.media.set_enabled(TrackKind::Camera, self.camera_on).await {
            tracing::warn!(error = %e, "Failed to toggle camera");
        }
        self.camera_on
    }

    /// Start or stop sharing. On failure the sharing flag is reset and the
    /// error carries the text to show.
    pub async fn toggle_screen_share(&mut self) -> Result<bool> {
        if self.screen_sharing {
            self.screen_sharing = false;
            stop_screen_share(self.media.as_ref()).await?;
        } else {
            self.screen_sharing = true;
            if let Err(e) = start_screen_share(self.media.as_ref()).await {
                self.screen_sharing = false;
                return Err(e);
            }
        }
        Ok(self.screen_sharing)
    }

    pub fn toggle_chat(&mut self) -> SidePanel {
        self.panel = if self.panel == SidePanel::Chat {
            SidePanel::None
        } else {
            SidePanel::Chat
        };
        self.panel
    }

    pub fn toggle_participants(&mut self) -> SidePanel {
        self.panel = if self.panel == SidePanel::Participants {
            SidePanel::None
        } else {
            SidePanel::Participants
        };
        self.panel
    }

    pub fn toggle_whiteboard(&mut self) -> bool {
        self.whiteboard_open = !self.whiteboard_open;
        self.whiteboard_open
    }

    /// Flip the local hand and broadcast it. Returns the hand state after
    /// the call.
    ///
    /// The channel does not echo our own frames, so the local set is updated
    /// here as well, but only once the toggle went out. While signaling is
    /// down the hand stays as it was.
    pub async fn toggle_raise_hand(&mut self) -> bool {
        let is_raised = !self.hands.is_raised(&self.user.id);
        let sent = self
            .rtm
            .send(&RtmEvent::raise_hand(self.user.id.clone(), is_raised))
            .await;
        if !sent {
            tracing::warn!(user_id = %self.user.id, "Signaling offline, hand not toggled");
            return !is_raised;
        }
        self.hands.set(&self.user.id, is_raised);
        is_raised
    }

    pub async fn send_reaction(&mut self, emoji: &str) {
        let event = ReactionEvent {
            emoji: emoji.to_string(),
            from_name: self.user.name.clone(),
        };
        self.reactions.ingest([event.clone()]);
        self.rtm.send(&RtmEvent::Reaction(event)).await;
    }

    /// Move newly received reactions and hand toggles into view state.
    /// Returns how many events were consumed.
    pub fn pump_events(&mut self) -> usize {
        let reactions = self.reaction_cursor.drain_new();
        let hands = self.hand_cursor.drain_new();
        let consumed = reactions.len() + hands.len();

        self.reactions.ingest(reactions);
        for event in &hands {
            self.hands.apply(event);
        }
        consumed
    }

    /// Leave the media channel, drop signaling and go back to the dashboard
    pub async fn end_call(&mut self) {
        if let Err(e) = self.media.leave().await {
            tracing::warn!(error = %e, "Failed to leave media channel");
        }
        self.rtm.disconnect().await;
        self.screen_sharing = false;
        self.navigator.push(Route::Home);
        tracing::info!(room = %self.room, "Call ended");
    }

    // ==================== View state ====================

    pub fn mic_on(&self) -> bool {
        self.mic_on
    }

    pub fn camera_on(&self) -> bool {
        self.camera_on
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.screen_sharing
    }

    pub fn panel(&self) -> SidePanel {
        self.panel
    }

    pub fn is_whiteboard_open(&self) -> bool {
        self.whiteboard_open
    }

    pub fn is_hand_raised(&self) -> bool {
        self.hands.is_raised(&self.user.id)
    }

    pub fn raised_hands(&self) -> &RaisedHands {
        &self.hands
    }

    pub fn reactions(&mut self) -> &[FloatingReaction] {
        self.reactions.visible()
    }

    fn local_media(&self) -> LocalMedia {
        LocalMedia {
            mic_on: self.mic_on,
            camera_on: self.camera_on,
            screen_sharing: self.screen_sharing,
        }
    }

    pub fn participants(&self) -> Vec<Participant> {
        build_roster(
            &self.user,
            self.local_media(),
            &self.media.remote_users(),
            &self.hands,
        )
    }

    pub fn main_stage(&self) -> Option<MainStage> {
        main_stage(self.screen_sharing, &self.media.remote_users())
    }

    pub fn layout(&self) -> VideoLayout {
        layout(self.participants(), self.main_stage())
    }
}
