use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Signaling error: {0}")]
    Signaling(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Server response did not contain a valid token.")]
    MissingToken,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Text shown inline to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Unauthorized(_) | ClientError::SessionExpired => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ClientError::NotAuthenticated => "Please sign in to continue.".to_string(),
            ClientError::Network(_) => "An error occurred. Please try again.".to_string(),
            ClientError::InvalidInput(msg) | ClientError::Media(msg) => msg.clone(),
            ClientError::MissingToken => self.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this failure means the stored credential is no longer usable.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized(_) | ClientError::SessionExpired | ClientError::Jwt(_)
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Json(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Json(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ClientError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ClientError::Jwt(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Signaling(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_shows_server_message() {
        let err = ClientError::Api {
            status: 400,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.user_message(), "Email already registered");
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_network_error_is_generic() {
        let err = ClientError::Network("connection refused".to_string());
        assert_eq!(err.user_message(), "An error occurred. Please try again.");
    }

    #[test]
    fn test_auth_failures() {
        assert!(ClientError::SessionExpired.is_auth_failure());
        assert!(ClientError::Unauthorized("401".to_string()).is_auth_failure());
        assert!(!ClientError::MissingToken.is_auth_failure());
    }
}
