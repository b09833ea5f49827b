//! Token liveness and coordinated refresh.
//!
//! [`is_token_expired`] is a pure function of the token string and the
//! current time; it never touches storage or the network and never fails
//! open. [`TokenService`] owns the single-flight refresh: however many
//! request flows notice an expired token at once, exactly one refresh call
//! reaches the backend and every caller observes its result.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::refresh::{RefreshClient, RefreshError};
use super::store::{TokenKind, TokenStore};

/// Safety buffer subtracted from `exp` before comparing to the current
/// time, covering clock drift and request latency.
const EXPIRY_BUFFER_SECS: i64 = 120;

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

/// Check whether an access token is expired (or close enough to expiry that
/// it must not be sent).
///
/// Decodes the claims segment of the token, tolerating the URL-safe base64
/// alphabet, and applies the 120 s safety buffer. Absent tokens and any
/// decode or parse failure report expired — this function fails closed and
/// never panics or errors.
#[must_use]
pub fn is_token_expired(token: Option<&str>) -> bool {
    let Some(token) = token else { return true };
    match decode_expiry(token) {
        Some(exp) => Utc::now().timestamp() > exp - EXPIRY_BUFFER_SECS,
        None => true,
    }
}

fn decode_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    if payload.is_empty() {
        return None;
    }

    // Translate the URL-safe alphabet and restore padding before decoding.
    let normalized: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    let padded = match normalized.len() % 4 {
        0 => normalized,
        2 => format!("{normalized}=="),
        3 => format!("{normalized}="),
        _ => return None,
    };

    let bytes = BASE64_STANDARD.decode(padded.as_bytes()).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    Some(claims.exp)
}

type AuthFailureListener = Box<dyn Fn() + Send + Sync>;
type RefreshFlight = Shared<BoxFuture<'static, Option<String>>>;

/// Coordinates token refresh for every request flow in the process.
///
/// Holds no token state of its own beyond the in-flight refresh handle;
/// the token pair lives exclusively in the [`TokenStore`]. Construct once
/// at startup and share by `Arc`.
pub struct TokenService<C, S> {
    refresh_client: Arc<C>,
    store: Arc<S>,
    inflight: Arc<Mutex<Option<RefreshFlight>>>,
    on_auth_failure: Arc<Mutex<Option<AuthFailureListener>>>,
}

impl<C, S> TokenService<C, S>
where
    C: RefreshClient + 'static,
    S: TokenStore + 'static,
{
    /// Create a token service over the given refresh transport and store.
    #[must_use]
    pub fn new(refresh_client: C, store: Arc<S>) -> Self {
        Self {
            refresh_client: Arc::new(refresh_client),
            store,
            inflight: Arc::new(Mutex::new(None)),
            on_auth_failure: Arc::new(Mutex::new(None)),
        }
    }

    /// The underlying token store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Register the auth-failure listener.
    ///
    /// A single mutable slot: re-registering replaces the previous listener.
    /// Invoked synchronously from the authoritative refresh-failure path and
    /// expected to perform logout/navigation side effects.
    pub fn set_auth_failure_listener(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.on_auth_failure.lock() = Some(Box::new(callback));
    }

    /// Current stored access token, if any.
    ///
    /// Storage errors degrade to `None`, matching the request pipeline's
    /// "go out without auth and let the 401 path handle it" posture.
    pub async fn access_token(&self) -> Option<String> {
        self.store.get(TokenKind::Access).await.ok().flatten()
    }

    /// Refresh the access token, de-duplicating concurrent attempts.
    ///
    /// If a refresh is already in flight every caller awaits the identical
    /// pending result; no second backend call is issued until it settles.
    /// The shared handle is cleared unconditionally once the flight
    /// settles, so a later call always starts a fresh attempt.
    ///
    /// Resolves to the new access token, or `None` on failure. Only an
    /// authoritative rejection (no refresh token stored, or backend
    /// 401/403) clears stored credentials and fires the failure listener;
    /// ambiguous failures leave the session intact.
    pub async fn perform_token_refresh(&self) -> Option<String> {
        let flight = {
            let mut cell = self.inflight.lock();
            if let Some(flight) = cell.as_ref() {
                debug!("refresh already in flight, awaiting shared result");
                flight.clone()
            } else {
                let refresh_client = Arc::clone(&self.refresh_client);
                let store = Arc::clone(&self.store);
                let listener = Arc::clone(&self.on_auth_failure);
                let inflight = Arc::clone(&self.inflight);
                let flight: RefreshFlight = async move {
                    let result = refresh_once(refresh_client, store, listener).await;
                    // Clear the handle as the flight's own final step so the
                    // next call starts fresh regardless of outcome.
                    inflight.lock().take();
                    result
                }
                .boxed()
                .shared();
                *cell = Some(flight.clone());
                flight
            }
        };
        flight.await
    }
}

async fn refresh_once<C, S>(
    refresh_client: Arc<C>,
    store: Arc<S>,
    listener: Arc<Mutex<Option<AuthFailureListener>>>,
) -> Option<String>
where
    C: RefreshClient,
    S: TokenStore,
{
    let refresh_token = match store.get(TokenKind::Refresh).await {
        Ok(Some(token)) => token,
        Ok(None) => {
            warn!("no refresh token stored, ending session");
            fail_authoritative(&*store, &listener).await;
            return None;
        }
        Err(err) => {
            warn!(error = %err, "token store unreadable, treating refresh as transient failure");
            return None;
        }
    };

    debug!("starting token refresh");
    match refresh_client.refresh(&refresh_token).await {
        Ok(tokens) => {
            if let Err(err) = store.set(TokenKind::Access, &tokens.access_token).await {
                warn!(error = %err, "failed to persist refreshed access token");
                return None;
            }
            if let Some(new_refresh) = &tokens.refresh_token {
                if let Err(err) = store.set(TokenKind::Refresh, new_refresh).await {
                    warn!(error = %err, "failed to persist rotated refresh token");
                }
            }
            info!("access token refreshed");
            Some(tokens.access_token)
        }
        Err(RefreshError::Rejected(status)) => {
            warn!(%status, "refresh rejected by backend, ending session");
            fail_authoritative(&*store, &listener).await;
            None
        }
        Err(err) => {
            // Ambiguous failure: the session survives, caller retries later.
            warn!(error = %err, "refresh failed, keeping session");
            None
        }
    }
}

async fn fail_authoritative<S: TokenStore + ?Sized>(
    store: &S,
    listener: &Mutex<Option<AuthFailureListener>>,
) {
    if let Err(err) = store.clear_all().await {
        warn!(error = %err, "failed to clear stored credentials");
    }
    if let Some(callback) = listener.lock().as_ref() {
        callback();
    }
}
