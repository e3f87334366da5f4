use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Client-side views
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Home,
    Room(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Home => "/".to_string(),
            Route::Room(name) => format!("/{}", name),
        }
    }

    pub fn parse(path: &str) -> Option<Route> {
        match path {
            "/" | "" => Some(Route::Home),
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            other => {
                let name = other.strip_prefix('/')?;
                if name.is_empty() || name.contains('/') {
                    None
                } else {
                    Some(Route::Room(name.to_string()))
                }
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Routes kept in [`Navigator::history`]; older entries are dropped.
pub const HISTORY_LIMIT: usize = 32;

/// Shared navigation handle. Views push routes, front ends watch them.
#[derive(Clone)]
pub struct Navigator {
    tx: Arc<watch::Sender<Route>>,
    history: Arc<Mutex<Vec<Route>>>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (tx, _rx) = watch::channel(initial.clone());
        Self {
            tx: Arc::new(tx),
            history: Arc::new(Mutex::new(vec![initial])),
        }
    }

    pub fn push(&self, route: Route) {
        tracing::debug!(path = %route, "Navigating");
        if let Ok(mut history) = self.history.lock() {
            if history.len() == HISTORY_LIMIT {
                history.remove(0);
            }
            history.push(route.clone());
        }
        self.tx.send_replace(route);
    }

    pub fn current(&self) -> Route {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }

    /// Stream of routes, starting with the current one
    pub fn routes(&self) -> WatchStream<Route> {
        WatchStream::new(self.tx.subscribe())
    }

    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}
