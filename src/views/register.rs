use tokio::task::JoinHandle;

use crate::error::ClientError;
use crate::routing::Route;
use crate::state::AppState;

pub const REGISTERED: &str = "Registration successful! Redirecting to login...";
pub const REGISTER_FAILED: &str = "Failed to register";
pub const MIN_PASSWORD_LEN: usize = 6;

pub struct RegisterView {
    state: AppState,
    pub name: String,
    pub email: String,
    pub password: String,
    error: Option<String>,
    success: Option<String>,
    is_submitting: bool,
    redirect: Option<JoinHandle<()>>,
}

impl RegisterView {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            name: String::new(),
            email: String::new(),
            password: String::new(),
            error: None,
            success: None,
            is_submitting: false,
            redirect: None,
        }
    }

    pub async fn redirect_if_authenticated(&self) -> bool {
        let session = &self.state.session;
        if !session.is_loading().await && session.is_authenticated().await {
            self.state.navigator.push(Route::Home);
            return true;
        }
        false
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty()
        {
            return Err("All fields are required.".to_string());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {} characters.",
                MIN_PASSWORD_LEN
            ));
        }
        Ok(())
    }

    /// Register the account; on success the view moves to Login after the
    /// configured delay.
    pub async fn submit(&mut self) -> bool {
        self.error = None;
        self.success = None;

        if let Err(msg) = self.validate() {
            self.error = Some(msg);
            return false;
        }

        self.is_submitting = true;
        let result = self
            .state
            .api
            .register(self.name.trim(), self.email.trim(), &self.password)
            .await;
        self.is_submitting = false;

        match result {
            Ok(()) => {
                self.success = Some(REGISTERED.to_string());
                let navigator = self.state.navigator.clone();
                let delay = self.state.config.register_redirect_delay();
                self.redirect = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.push(Route::Login);
                }));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registration failed");
                self.error = Some(match e {
                    ClientError::Api { message, .. } => message,
                    _ => REGISTER_FAILED.to_string(),
                });
                false
            }
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    /// Wait for a pending redirect to fire
    pub async fn redirected(&mut self) {
        if let Some(handle) = self.redirect.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for RegisterView {
    fn drop(&mut self) {
        if let Some(handle) = self.redirect.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::config::Config;
    use std::sync::Arc;

    fn view() -> RegisterView {
        let config = Config::for_base_url("http://127.0.0.1:9", "app").unwrap();
        RegisterView::new(AppState::new(config, Arc::new(MemoryTokenStore::new())).unwrap())
    }

    #[tokio::test]
    async fn test_missing_fields_rejected_before_request() {
        let mut view = view();
        view.email = "alice@example.com".to_string();
        view.password = "longenough".to_string();

        assert!(!view.submit().await);
        assert_eq!(view.error(), Some("All fields are required."));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let mut view = view();
        view.name = "Alice".to_string();
        view.email = "alice@example.com".to_string();
        view.password = "12345".to_string();

        assert!(!view.submit().await);
        assert_eq!(view.error(), Some("Password must be at least 6 characters."));
        assert!(view.success().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_backend_uses_fallback_message() {
        let mut view = view();
        view.name = "Alice".to_string();
        view.email = "alice@example.com".to_string();
        view.password = "123456".to_string();

        assert!(!view.submit().await);
        assert_eq!(view.error(), Some(REGISTER_FAILED));
    }
}
