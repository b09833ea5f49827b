//! Token refresh transport.
//!
//! Abstracts the `POST /auth/refresh` call behind a trait so the token
//! service can be exercised against mock transports in tests and against
//! different backends in production.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{endpoints, ApiConfig};
use crate::error::ApiError;

/// Tokens minted by a successful refresh.
///
/// Rotation is optional: the backend may or may not issue a new refresh
/// token alongside the access token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Error from a refresh attempt.
///
/// `Rejected` is the authoritative variant: the backend explicitly refused
/// the refresh token. Everything else is ambiguous and must not end the
/// session.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// Backend rejected the refresh token (401/403).
    #[error("refresh rejected with status {0}")]
    Rejected(StatusCode),

    /// Backend answered success but the payload carried no access token.
    #[error("refresh response missing access token")]
    MissingAccessToken,

    /// Network failure, timeout, 5xx, or malformed body.
    #[error("refresh transport failure: {0}")]
    Transport(String),
}

/// Transport for the refresh operation.
#[async_trait]
pub trait RefreshClient: Send + Sync {
    /// Exchange a refresh token for new credentials.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenFields {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

// The backend answers either `{ data: { accessToken, ... } }` or the flat
// shape; tolerate both.
#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
    data: Option<TokenFields>,
    #[serde(flatten)]
    top: TokenFields,
}

fn extract_tokens(envelope: RefreshEnvelope) -> Result<RefreshedTokens, RefreshError> {
    let fields = envelope.data.unwrap_or(envelope.top);
    let access_token = fields.access_token.ok_or(RefreshError::MissingAccessToken)?;
    Ok(RefreshedTokens { access_token, refresh_token: fields.refresh_token })
}

/// Reqwest-backed refresh transport.
///
/// Carries its own timeout (15 s by default), distinct from the ordinary
/// request timeout.
pub struct HttpRefreshClient {
    http: reqwest::Client,
    url: String,
}

impl HttpRefreshClient {
    /// Build a refresh client for the configured backend.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(config.refresh_timeout).build()?;
        Ok(Self { http, url: config.api_url(endpoints::auth::REFRESH) })
    }
}

#[async_trait]
impl RefreshClient for HttpRefreshClient {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        let response = self
            .http
            .post(&self.url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RefreshError::Rejected(status));
        }
        if !status.is_success() {
            // 5xx and friends are transient; the session survives them.
            return Err(RefreshError::Transport(format!("refresh endpoint returned {status}")));
        }

        let envelope: RefreshEnvelope = response
            .json()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;
        extract_tokens(envelope)
    }
}
