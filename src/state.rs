use std::sync::Arc;

use crate::api::BackendApi;
use crate::auth::{SessionManager, TokenStore};
use crate::config::Config;
use crate::error::Result;
use crate::routing::{Navigator, Route};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: BackendApi,
    pub session: Arc<SessionManager>,
    pub navigator: Navigator,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let api = BackendApi::new(&config)?;
        let navigator = Navigator::new(Route::Home);
        let session = SessionManager::new(store, navigator.clone());

        Ok(Self {
            config: Arc::new(config),
            api,
            session: Arc::new(session),
            navigator,
        })
    }
}
