use crate::call::CallSetup;
use crate::models::{RoomName, User};
use crate::routing::Route;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomPageState {
    /// "Preparing your room..."
    Preparing,
    Ready { user: User, media_token: String },
    Failed { error: String },
}

/// Gate in front of a call: waits for the session, then fetches the media token
pub struct RoomPage {
    state: AppState,
    room: RoomName,
    status: RoomPageState,
}

impl RoomPage {
    pub fn new(state: AppState, room: RoomName) -> Self {
        Self {
            state,
            room,
            status: RoomPageState::Preparing,
        }
    }

    pub fn room(&self) -> &RoomName {
        &self.room
    }

    pub fn status(&self) -> &RoomPageState {
        &self.status
    }

    pub async fn prepare(&mut self) -> &RoomPageState {
        let session = &self.state.session;
        if session.is_loading().await {
            return &self.status;
        }

        // an expired token logs out here, which already routes to Login
        if let Err(e) = session.ensure_fresh().await {
            tracing::info!(room = %self.room, error = %e, "No usable session, leaving room");
            if self.state.navigator.current() != Route::Login {
                self.state.navigator.push(Route::Login);
            }
            return &self.status;
        }

        let (user, bearer) = match session.credentials().await {
            Ok(credentials) => credentials,
            Err(_) => {
                self.state.navigator.push(Route::Login);
                return &self.status;
            }
        };

        match self.state.api.media_token(&bearer, self.room.as_str()).await {
            Ok(media_token) => {
                tracing::info!(room = %self.room, "Media token issued");
                self.status = RoomPageState::Ready { user, media_token };
            }
            Err(e) if e.is_auth_failure() => {
                tracing::info!(room = %self.room, error = %e, "Media token rejected, logging out");
                session.logout().await;
            }
            Err(e) => {
                tracing::error!(room = %self.room, error = %e, "Failed to prepare room");
                self.status = RoomPageState::Failed {
                    error: format!("Could not join the room: {}", e.user_message()),
                };
            }
        }
        &self.status
    }

    /// Everything a call needs, once the page is ready
    pub fn call_setup(&self) -> Option<CallSetup> {
        match &self.status {
            RoomPageState::Ready { user, media_token } => Some(CallSetup {
                room: self.room.clone(),
                user: user.clone(),
                app_id: self.state.config.app_id.clone(),
                media_token: media_token.clone(),
                reaction_ttl: self.state.config.reaction_ttl(),
            }),
            _ => None,
        }
    }

    pub fn go_home(&self) {
        self.state.navigator.push(Route::Home);
    }
}
