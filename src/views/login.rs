use crate::error::ClientError;
use crate::routing::Route;
use crate::state::AppState;

pub const NO_ACCOUNT: &str = "No account found with this email. Please sign up.";
pub const GENERIC_FAILURE: &str = "An error occurred. Please try again.";
pub const LOGIN_FAILED: &str = "Failed to login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Email,
    Password,
}

/// Two-step sign in: the email is checked first, then the password is asked for
pub struct LoginView {
    state: AppState,
    step: LoginStep,
    email: String,
    password: String,
    error: Option<String>,
    is_submitting: bool,
}

impl LoginView {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            step: LoginStep::Email,
            email: String::new(),
            password: String::new(),
            error: None,
            is_submitting: false,
        }
    }

    /// Signed-in users have nothing to do here
    pub async fn redirect_if_authenticated(&self) -> bool {
        let session = &self.state.session;
        if !session.is_loading().await && session.is_authenticated().await {
            self.state.navigator.push(Route::Home);
            return true;
        }
        false
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub async fn submit_email(&mut self) {
        self.is_submitting = true;
        self.error = None;

        match self.state.api.check_email(&self.email).await {
            Ok(true) => self.step = LoginStep::Password,
            Ok(false) => self.error = Some(NO_ACCOUNT.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "Email check failed");
                self.error = Some(GENERIC_FAILURE.to_string());
            }
        }

        self.is_submitting = false;
    }

    /// Returns whether the session was established
    pub async fn submit_password(&mut self) -> bool {
        self.is_submitting = true;
        self.error = None;

        let result = match self.state.api.login(&self.email, &self.password).await {
            Ok(token) => self.state.session.login(&token).await.map(|_| ()),
            Err(e) => Err(e),
        };

        self.is_submitting = false;
        match result {
            Ok(()) => true,
            Err(e) => {
                self.error = Some(match e {
                    ClientError::Api { message, .. } => message,
                    ClientError::Network(_) => LOGIN_FAILED.to_string(),
                    other => other.user_message(),
                });
                false
            }
        }
    }

    pub fn back(&mut self) {
        self.step = LoginStep::Email;
        self.password.clear();
        self.error = None;
    }

    pub fn social_login(&self, provider: &str) -> String {
        format!("Signing in with {} is not yet implemented.", provider)
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }
}
