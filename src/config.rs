use std::env;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub app_id: String,
    pub rtm_url: String,
    pub chat_url: String,
    pub token_store_path: PathBuf,
    pub reaction_ttl_ms: u64,
    pub register_redirect_ms: u64,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_url = env::var("API_URL").map_err(|_| ConfigError::MissingApiUrl)?;
        let api_url = api_url.trim_end_matches('/').to_string();
        Url::parse(&api_url).map_err(|_| ConfigError::InvalidUrl(api_url.clone()))?;

        let rtm_url = match env::var("RTM_URL") {
            Ok(url) => url,
            Err(_) => derive_ws_url(&api_url, "rtm")?,
        };
        let chat_url = match env::var("CHAT_URL") {
            Ok(url) => url,
            Err(_) => derive_ws_url(&api_url, "chat")?,
        };

        Ok(Config {
            app_id: env::var("AGORA_APP_ID").map_err(|_| ConfigError::MissingAppId)?,
            rtm_url,
            chat_url,
            token_store_path: env::var("TOKEN_STORE_PATH")
                .unwrap_or_else(|_| ".utopia/token".to_string())
                .into(),
            reaction_ttl_ms: env::var("REACTION_TTL_MS")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(4000),
            register_redirect_ms: env::var("REGISTER_REDIRECT_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap_or(2000),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
            api_url,
        })
    }

    /// Config pointing every service at one base URL, used by tests and tooling.
    pub fn for_base_url(api_url: &str, app_id: &str) -> Result<Self, ConfigError> {
        let api_url = api_url.trim_end_matches('/').to_string();
        Ok(Config {
            rtm_url: derive_ws_url(&api_url, "rtm")?,
            chat_url: derive_ws_url(&api_url, "chat")?,
            app_id: app_id.to_string(),
            token_store_path: ".utopia/token".into(),
            reaction_ttl_ms: 4000,
            register_redirect_ms: 2000,
            http_timeout_secs: 15,
            api_url,
        })
    }

    pub fn reaction_ttl(&self) -> Duration {
        Duration::from_millis(self.reaction_ttl_ms)
    }

    pub fn register_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.register_redirect_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Swap the http(s) scheme of `base` for ws(s) and append `/{path}`.
fn derive_ws_url(base: &str, path: &str) -> Result<String, ConfigError> {
    let mut url = Url::parse(base).map_err(|_| ConfigError::InvalidUrl(base.to_string()))?;
    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => other,
    }
    .to_string();
    url.set_scheme(&scheme)
        .map_err(|_| ConfigError::InvalidUrl(base.to_string()))?;

    let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    Ok(url.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API_URL environment variable is required")]
    MissingApiUrl,
    #[error("AGORA_APP_ID environment variable is required")]
    MissingAppId,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
