use crate::models::{RoomName, User};
use crate::routing::Route;
use crate::state::AppState;

pub const SCHEDULE_PLACEHOLDER: &str =
    "This is a placeholder for the scheduling feature. Full implementation coming soon!";
pub const SHARE_PLACEHOLDER: &str = "This is a placeholder for sharing your screen directly \
from the dashboard. This feature is typically used when you are already in a meeting.";

/// Dashboard modals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeModal {
    Join,
    Schedule,
    Share,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinForm {
    pub room_name: String,
    pub display_name: String,
    pub no_audio: bool,
    pub video_off: bool,
}

impl JoinForm {
    pub fn can_submit(&self) -> bool {
        !self.room_name.trim().is_empty() && !self.display_name.trim().is_empty()
    }
}

pub struct HomeView {
    state: AppState,
    user: User,
    modal: Option<HomeModal>,
    pub join: JoinForm,
}

impl HomeView {
    /// `None` when the dashboard is not available yet: still loading, or the
    /// user was sent to Login.
    pub async fn load(state: AppState) -> Option<Self> {
        if state.session.is_loading().await {
            return None;
        }
        let Some(user) = state.session.user().await else {
            state.navigator.push(Route::Login);
            return None;
        };

        let join = JoinForm {
            display_name: user.name.clone(),
            ..JoinForm::default()
        };
        Some(Self {
            state,
            user,
            modal: None,
            join,
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Start a meeting in a freshly generated room
    pub fn new_meeting(&self) -> Route {
        let route = Route::Room(RoomName::generate().to_string());
        self.state.navigator.push(route.clone());
        route
    }

    /// Go to the room typed into the join form
    pub fn submit_join(&mut self) -> Option<Route> {
        if !self.join.can_submit() {
            return None;
        }
        let room = match RoomName::parse(&self.join.room_name) {
            Ok(room) => room,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected room name");
                return None;
            }
        };
        let route = Route::Room(room.to_string());
        self.modal = None;
        self.state.navigator.push(route.clone());
        Some(route)
    }

    pub fn open(&mut self, modal: HomeModal) {
        self.modal = Some(modal);
    }

    pub fn close(&mut self) {
        self.modal = None;
    }

    pub fn modal(&self) -> Option<HomeModal> {
        self.modal
    }
}
