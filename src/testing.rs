//! Test doubles and fixture builders.
//!
//! Shared by the crate's unit tests and integration tests; also useful for
//! downstream crates exercising code paths that depend on token refresh
//! without a live backend.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use parking_lot::Mutex;

use crate::auth::{RefreshClient, RefreshError, RefreshedTokens};

/// Build a syntactically valid JWT-shaped token whose claims carry the given
/// `exp` (seconds since the Unix epoch). Header and signature segments are
/// placeholders; only the claims segment is ever decoded.
#[must_use]
pub fn token_with_expiry(exp: i64) -> String {
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"test-user","exp":{exp}}}"#));
    format!("header.{claims}.signature")
}

/// Scripted [`RefreshClient`] that counts calls and answers a fixed outcome,
/// optionally after a delay (to hold a refresh in flight while concurrent
/// callers pile up).
pub struct MockRefreshClient {
    outcome: Mutex<Result<RefreshedTokens, RefreshError>>,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl MockRefreshClient {
    /// Create a mock answering the given outcome on every call.
    #[must_use]
    pub fn new(outcome: Result<RefreshedTokens, RefreshError>) -> Self {
        Self { outcome: Mutex::new(outcome), delay: None, calls: AtomicU32::new(0) }
    }

    /// Create a mock that succeeds with the given access token and no
    /// refresh-token rotation.
    #[must_use]
    pub fn succeeding(access_token: &str) -> Self {
        Self::new(Ok(RefreshedTokens {
            access_token: access_token.to_string(),
            refresh_token: None,
        }))
    }

    /// Delay each call by the given duration before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the scripted outcome for subsequent calls.
    pub fn set_outcome(&self, outcome: Result<RefreshedTokens, RefreshError>) {
        *self.outcome.lock() = outcome;
    }

    /// Number of refresh calls issued so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefreshClient for MockRefreshClient {
    async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.lock().clone()
    }
}
