use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

/// Authenticated identity decoded from the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// JWT Claims issued by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "numeric_date")]
    pub iat: i64,
    #[serde(deserialize_with = "numeric_date")]
    pub exp: i64,
}

/// NumericDate may be fractional. Fractions are truncated so a token never
/// outlives its stated expiry.
fn numeric_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let seconds = f64::deserialize(deserializer)?;
    if !seconds.is_finite() {
        return Err(D::Error::custom("NumericDate must be finite"));
    }
    Ok(seconds.floor() as i64)
}

impl Claims {
    /// `exp` is in seconds, `now_ms` in milliseconds.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.exp.saturating_mul(1000) < now_ms
    }

    pub fn user(&self) -> User {
        User {
            id: self.sub.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// POST /auth/check-email body
#[derive(Debug, Serialize)]
pub struct CheckEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckEmailResponse {
    #[serde(default)]
    pub exists: bool,
}

/// POST /auth/login body
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register body
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Media and signaling token responses. The token is kept loose so a
/// non-string value can be reported instead of failing deserialization.
#[derive(Debug, Deserialize)]
pub struct MediaTokenResponse {
    #[serde(default)]
    pub token: Option<serde_json::Value>,
}

impl MediaTokenResponse {
    pub fn token_str(&self) -> Option<&str> {
        self.token.as_ref().and_then(|t| t.as_str())
    }
}

/// Error body returned by the backend on non-2xx responses
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: i64) -> Claims {
        Claims {
            sub: "u-1".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            iat: exp - 900,
            exp,
        }
    }

    #[test]
    fn test_expiry_compares_milliseconds() {
        let c = claims(1_700_000_000);
        assert!(!c.is_expired_at(1_700_000_000_000));
        assert!(c.is_expired_at(1_700_000_000_001));
    }

    #[test]
    fn test_claims_accept_fractional_dates() {
        let c: Claims = serde_json::from_str(
            r#"{"sub":"u-1","name":"Alice","email":"a@example.com","exp":1792208026.5}"#,
        )
        .unwrap();
        assert_eq!(c.exp, 1_792_208_026);
        assert_eq!(c.iat, 0);
        assert!(c.is_expired_at(1_792_208_026_001));
    }

    #[test]
    fn test_media_token_must_be_string() {
        let ok: MediaTokenResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(ok.token_str(), Some("abc"));

        let bad: MediaTokenResponse = serde_json::from_str(r#"{"token":42}"#).unwrap();
        assert_eq!(bad.token_str(), None);

        let missing: MediaTokenResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.token_str(), None);
    }
}
