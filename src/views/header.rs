use crate::routing::Route;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub href: Option<&'static str>,
}

pub const NAV_ITEMS: [NavItem; 6] = [
    NavItem { label: "Home", href: Some("/") },
    NavItem { label: "Team Chat", href: None },
    NavItem { label: "Scheduler", href: None },
    NavItem { label: "Docs", href: None },
    NavItem { label: "Whiteboards", href: None },
    NavItem { label: "More", href: None },
];

/// Outcome of clicking a nav item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Navigated(Route),
    NotImplemented(String),
}

pub struct Header {
    state: AppState,
}

impl Header {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn items(&self) -> &'static [NavItem] {
        &NAV_ITEMS
    }

    pub fn is_active(&self, item: &NavItem) -> bool {
        item.href == Some(self.state.navigator.current().path().as_str())
    }

    pub fn select(&self, item: &NavItem) -> NavOutcome {
        match item.href.and_then(Route::parse) {
            Some(route) => {
                self.state.navigator.push(route.clone());
                NavOutcome::Navigated(route)
            }
            None => NavOutcome::NotImplemented(format!(
                "{} feature is not yet implemented.",
                item.label
            )),
        }
    }

    /// Display name, once a user is signed in
    pub async fn user_name(&self) -> Option<String> {
        self.state.session.user().await.map(|u| u.name)
    }

    pub async fn logout(&self) {
        self.state.session.logout().await;
    }
}
