//! Session lifecycle: login, registration, logout.
//!
//! Login and registration are the only flows that mint a token pair from
//! scratch; this service persists it into the shared token store so the
//! pipeline can attach and refresh it from then on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{RefreshClient, TokenKind, TokenStore};
use crate::client::ApiClient;
use crate::config::endpoints;
use crate::error::ApiError;

/// Login credentials.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Authenticated account profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Backend answer to login/register: profile plus a fresh token pair.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: User,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Session endpoints.
pub struct SessionApi<C, S> {
    client: Arc<ApiClient<C, S>>,
}

impl<C, S> SessionApi<C, S>
where
    C: RefreshClient + 'static,
    S: TokenStore + 'static,
{
    #[must_use]
    pub fn new(client: Arc<ApiClient<C, S>>) -> Self {
        Self { client }
    }

    /// Authenticate and persist the issued token pair.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let payload: AuthPayload = self.client.post(endpoints::auth::LOGIN, credentials).await?;
        self.persist(&payload).await?;
        info!(user = %payload.user.id, "session established");
        Ok(payload.user)
    }

    /// Create an account and persist the issued token pair.
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let payload: AuthPayload =
            self.client.post(endpoints::auth::REGISTER, registration).await?;
        self.persist(&payload).await?;
        info!(user = %payload.user.id, "account registered");
        Ok(payload.user)
    }

    /// End the session.
    ///
    /// Local credentials are cleared even when the backend call fails; the
    /// user asked to be logged out and stale tokens must not linger.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result: Result<serde_json::Value, ApiError> =
            self.client.post_empty(endpoints::auth::LOGOUT).await;
        if let Err(err) = &result {
            warn!(error = %err, "logout call failed, clearing local session anyway");
        }
        self.client.tokens().store().clear_all().await?;
        result.map(|_| ())
    }

    async fn persist(&self, payload: &AuthPayload) -> Result<(), ApiError> {
        let store = self.client.tokens().store();
        store.set(TokenKind::Access, &payload.access_token).await?;
        if let Some(refresh) = &payload.refresh_token {
            store.set(TokenKind::Refresh, refresh).await?;
        }
        Ok(())
    }
}
