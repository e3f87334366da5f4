//! REST client for the backend: account checks, login, registration and
//! token issuance for the media and signaling services.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{
    AccessTokenResponse, CheckEmailRequest, CheckEmailResponse, ErrorBody, LoginRequest,
    MediaTokenResponse, RegisterRequest,
};

#[derive(Clone)]
pub struct BackendApi {
    client: Client,
    base_url: String,
}

impl BackendApi {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST /auth/check-email
    pub async fn check_email(&self, email: &str) -> Result<bool> {
        let res = self
            .client
            .post(self.url("/auth/check-email"))
            .json(&CheckEmailRequest {
                email: email.to_string(),
            })
            .send()
            .await?;

        let body: CheckEmailResponse = res.json().await?;
        Ok(body.exists)
    }

    /// POST /auth/login, returns the access token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let body: AccessTokenResponse = parse_json(res, "Failed to login").await?;
        Ok(body.access_token)
    }

    /// POST /auth/register
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&RegisterRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(api_error(res, "Failed to register").await);
        }

        tracing::info!(email = %email, "Account registered");
        Ok(())
    }

    /// GET /agora/token?roomName=... for the media service
    pub async fn media_token(&self, bearer: &str, room_name: &str) -> Result<String> {
        let res = self
            .client
            .get(self.url("/agora/token"))
            .query(&[("roomName", room_name)])
            .bearer_auth(bearer)
            .send()
            .await?;

        if res.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized(
                "Media token request rejected".to_string(),
            ));
        }

        let body: MediaTokenResponse =
            parse_json(res, "Failed to get room token from server.").await?;
        body.token_str()
            .map(str::to_string)
            .ok_or(ClientError::MissingToken)
    }

    /// GET /agora/rtm-token for the signaling service
    pub async fn rtm_token(&self, bearer: &str) -> Result<String> {
        let res = self
            .client
            .get(self.url("/agora/rtm-token"))
            .bearer_auth(bearer)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("Failed to fetch RTM token: {} {}", status.as_u16(), body),
            });
        }

        let body: MediaTokenResponse = res.json().await?;
        body.token_str()
            .map(str::to_string)
            .ok_or(ClientError::MissingToken)
    }
}

async fn parse_json<T: DeserializeOwned>(res: Response, fallback: &str) -> Result<T> {
    if !res.status().is_success() {
        return Err(api_error(res, fallback).await);
    }
    Ok(res.json().await?)
}

/// Build an `Api` error from the `{ message }` body, falling back when absent
async fn api_error(res: Response, fallback: &str) -> ClientError {
    let status = res.status().as_u16();
    let body: ErrorBody = res.json().await.unwrap_or_default();
    let message = body
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());

    tracing::warn!(status, message = %message, "Backend request failed");
    ClientError::Api { status, message }
}
