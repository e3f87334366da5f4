use std::collections::HashSet;

use crate::call::RaisedHands;
use crate::media::{media_uid, RemoteUser};
use crate::models::User;

/// Row in the participants panel / tile in the video grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub uid: u32,
    pub label: String,
    pub is_local: bool,
    pub has_audio: bool,
    pub has_video: bool,
    pub has_screen_share: bool,
    pub hand_raised: bool,
}

/// Local state the roster needs besides the SDK's remote users
#[derive(Debug, Clone, Copy)]
pub struct LocalMedia {
    pub mic_on: bool,
    pub camera_on: bool,
    pub screen_sharing: bool,
}

/// Local user first, then remote users in SDK order.
///
/// Raised hands are keyed by account id while the SDK only knows integer
/// uids, so remote rows are matched through [`media_uid`].
pub fn build_roster(
    local_user: &User,
    local: LocalMedia,
    remote: &[RemoteUser],
    hands: &RaisedHands,
) -> Vec<Participant> {
    let raised_uids: HashSet<u32> = hands.iter().map(media_uid).collect();

    let mut roster = Vec::with_capacity(remote.len() + 1);
    roster.push(Participant {
        uid: media_uid(&local_user.id),
        label: format!("{} (You)", local_user.name),
        is_local: true,
        has_audio: local.mic_on,
        has_video: local.camera_on,
        has_screen_share: local.screen_sharing,
        hand_raised: hands.is_raised(&local_user.id),
    });

    roster.extend(remote.iter().map(|user| Participant {
        uid: user.uid,
        label: format!("User {}", user.uid),
        is_local: false,
        has_audio: user.has_audio,
        has_video: user.has_video,
        has_screen_share: user.has_screen_share,
        hand_raised: raised_uids.contains(&user.uid),
    }));

    roster
}

/// What occupies the main stage while someone shares a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainStage {
    LocalScreen,
    Remote(u32),
}

/// Video grid arrangement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoLayout {
    /// Everyone in equal tiles
    Grid(Vec<Participant>),
    /// A shared screen on the main stage with camera tiles alongside
    ScreenShare {
        stage: MainStage,
        sidebar: Vec<Participant>,
    },
}

/// Local screen wins, otherwise the first remote user that shares
pub fn main_stage(local_sharing: bool, remote: &[RemoteUser]) -> Option<MainStage> {
    if local_sharing {
        return Some(MainStage::LocalScreen);
    }
    remote
        .iter()
        .find(|u| u.has_screen_share)
        .map(|u| MainStage::Remote(u.uid))
}

pub fn layout(roster: Vec<Participant>, stage: Option<MainStage>) -> VideoLayout {
    match stage {
        None => VideoLayout::Grid(roster),
        Some(stage) => {
            let sidebar = roster
                .into_iter()
                .filter(|p| match stage {
                    MainStage::Remote(uid) => p.is_local || p.uid != uid,
                    MainStage::LocalScreen => true,
                })
                .collect();
            VideoLayout::ScreenShare { stage, sidebar }
        }
    }
}
