pub mod store;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, DecodingKey, Validation};
use tokio::sync::RwLock;

use crate::error::{ClientError, Result};
use crate::models::{Claims, User};
use crate::routing::{Navigator, Route};

/// Decode a bearer token issued by the backend.
///
/// The client never holds the signing secret, so only the payload is read.
/// Audience is not checked, and expiry is checked separately by
/// [`Claims::is_expired_at`].
pub fn decode_token(token: &str) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(token_data.claims)
}

#[derive(Debug)]
struct SessionState {
    user: Option<User>,
    token: Option<String>,
    claims: Option<Claims>,
    is_loading: bool,
}

/// Authenticated session bound to a token store
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    navigator: Navigator,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn TokenStore>, navigator: Navigator) -> Self {
        Self {
            store,
            navigator,
            state: RwLock::new(SessionState {
                user: None,
                token: None,
                claims: None,
                is_loading: true,
            }),
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Load the stored token, logging out if it is expired or unreadable
    pub async fn restore(&self) {
        self.state.write().await.is_loading = true;

        match self.store.load() {
            Ok(Some(token)) => match decode_token(&token) {
                Ok(claims) if claims.is_expired_at(Utc::now().timestamp_millis()) => {
                    tracing::info!(user_id = %claims.sub, "Stored token expired, logging out");
                    self.logout().await;
                }
                Ok(claims) => {
                    tracing::info!(user_id = %claims.sub, "Session restored");
                    let mut state = self.state.write().await;
                    state.user = Some(claims.user());
                    state.token = Some(token);
                    state.claims = Some(claims);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Invalid token found, logging out.");
                    self.logout().await;
                }
            },
            Ok(None) => {
                tracing::debug!("No stored token");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read token store");
                self.logout().await;
            }
        }

        self.state.write().await.is_loading = false;
    }

    /// Persist a freshly issued token and go to the dashboard
    pub async fn login(&self, token: &str) -> Result<User> {
        self.store.save(token)?;
        let claims = decode_token(token)?;
        let user = claims.user();

        {
            let mut state = self.state.write().await;
            state.user = Some(user.clone());
            state.token = Some(token.to_string());
            state.claims = Some(claims);
            state.is_loading = false;
        }

        tracing::info!(user_id = %user.id, "Logged in");
        self.navigator.push(Route::Home);
        Ok(user)
    }

    pub async fn logout(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear token store");
        }

        {
            let mut state = self.state.write().await;
            state.user = None;
            state.token = None;
            state.claims = None;
        }

        if self.navigator.current() != Route::Login {
            self.navigator.push(Route::Login);
        }
    }

    /// Force a logout if the in-memory token has expired since it was loaded
    pub async fn ensure_fresh(&self) -> Result<()> {
        let expired = {
            let state = self.state.read().await;
            match &state.claims {
                Some(claims) => claims.is_expired_at(Utc::now().timestamp_millis()),
                None => return Err(ClientError::NotAuthenticated),
            }
        };

        if expired {
            tracing::info!("Session token expired, forcing logout");
            self.logout().await;
            return Err(ClientError::SessionExpired);
        }
        Ok(())
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    /// User and token together, or `NotAuthenticated`
    pub async fn credentials(&self) -> Result<(User, String)> {
        let state = self.state.read().await;
        match (&state.user, &state.token) {
            (Some(user), Some(token)) => Ok((user.clone(), token.clone())),
            _ => Err(ClientError::NotAuthenticated),
        }
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        state.user.is_some() && state.token.is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub(crate) fn mint_token(user_id: &str, name: &str, exp_offset_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            iat: now,
            exp: now + exp_offset_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"backend-only-secret"),
        )
        .expect("Should encode token")
    }

    fn manager(store: Arc<dyn TokenStore>, start: Route) -> SessionManager {
        SessionManager::new(store, Navigator::new(start))
    }

    #[test]
    fn test_decode_without_secret() {
        let token = mint_token("user-123", "Alice", 900);
        let claims = decode_token(&token).expect("Should decode token");

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_audience_and_fractional_expiry_are_accepted() {
        let exp = Utc::now().timestamp() as f64 + 900.5;
        let token = encode(
            &Header::default(),
            &serde_json::json!({
                "sub": "user-123",
                "name": "Alice",
                "email": "alice@example.com",
                "aud": "utopia-web",
                "iat": exp - 1800.0,
                "exp": exp,
            }),
            &EncodingKey::from_secret(b"backend-only-secret"),
        )
        .expect("Should encode token");

        let claims = decode_token(&token).expect("Should decode token");
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.exp, exp.floor() as i64);

        let store = Arc::new(MemoryTokenStore::with_token(&token));
        let session = manager(store, Route::Home);
        session.restore().await;
        assert!(session.is_authenticated().await);
        assert_eq!(session.navigator().current(), Route::Home);
    }

    #[test]
    fn test_decode_invalid_token() {
        assert!(decode_token("invalid-token").is_err());
    }

    #[tokio::test]
    async fn test_restore_valid_token() {
        let token = mint_token("user-123", "Alice", 900);
        let session = manager(Arc::new(MemoryTokenStore::with_token(&token)), Route::Home);

        assert!(session.is_loading().await);
        session.restore().await;

        assert!(!session.is_loading().await);
        assert!(session.is_authenticated().await);
        assert_eq!(session.user().await.unwrap().name, "Alice");
        assert_eq!(session.token().await.as_deref(), Some(token.as_str()));
        assert_eq!(session.navigator().current(), Route::Home);
    }

    #[tokio::test]
    async fn test_expired_token_redirects_to_login() {
        let token = mint_token("user-123", "Alice", -60);
        let store = Arc::new(MemoryTokenStore::with_token(&token));
        let session = manager(store.clone(), Route::Room("standup".to_string()));

        session.restore().await;

        assert!(!session.is_authenticated().await);
        assert!(!session.is_loading().await);
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(session.navigator().current(), Route::Login);
    }

    #[tokio::test]
    async fn test_garbage_token_logs_out() {
        let store = Arc::new(MemoryTokenStore::with_token("not.a.jwt"));
        let session = manager(store.clone(), Route::Home);

        session.restore().await;

        assert!(!session.is_authenticated().await);
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(session.navigator().current(), Route::Login);
    }

    #[tokio::test]
    async fn test_login_persists_and_navigates_home() {
        let store = Arc::new(MemoryTokenStore::new());
        let session = manager(store.clone(), Route::Login);
        let token = mint_token("user-9", "Bob", 900);

        let user = session.login(&token).await.unwrap();

        assert_eq!(user.id, "user-9");
        assert_eq!(store.load().unwrap().as_deref(), Some(token.as_str()));
        assert_eq!(session.navigator().current(), Route::Home);
    }

    #[tokio::test]
    async fn test_logout_on_login_page_does_not_navigate() {
        let session = manager(Arc::new(MemoryTokenStore::new()), Route::Login);
        session.logout().await;
        assert_eq!(session.navigator().history(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_ensure_fresh_without_session() {
        let session = manager(Arc::new(MemoryTokenStore::new()), Route::Home);
        session.restore().await;
        assert!(matches!(
            session.ensure_fresh().await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_ensure_fresh_logs_out_expired_session() {
        let store = Arc::new(MemoryTokenStore::new());
        let session = manager(store.clone(), Route::Login);
        session
            .login(&mint_token("user-123", "Alice", -60))
            .await
            .unwrap();
        session.navigator().push(Route::Room("standup".to_string()));

        let err = session.ensure_fresh().await.unwrap_err();

        assert!(matches!(err, ClientError::SessionExpired));
        assert!(err.is_auth_failure());
        assert!(!session.is_authenticated().await);
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(session.navigator().current(), Route::Login);
    }

    #[tokio::test]
    async fn test_ensure_fresh_keeps_live_session() {
        let session = manager(Arc::new(MemoryTokenStore::new()), Route::Login);
        session
            .login(&mint_token("user-123", "Alice", 900))
            .await
            .unwrap();

        assert!(session.ensure_fresh().await.is_ok());
        assert!(session.is_authenticated().await);
        assert_eq!(session.navigator().current(), Route::Home);
    }
}
