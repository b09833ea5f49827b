//! Resilient API access layer for the storefront mobile client.
//!
//! Every call to the backend flows through one pipeline that makes
//! authentication continuity and cascading-failure protection transparent to
//! call sites:
//!
//! ```text
//! ┌──────────────┐
//! │   ApiClient  │  Request pipeline (auth attach + bounded retry)
//! └──────┬───────┘
//!        ├──► TokenService     (expiry check + single-flight refresh)
//!        │         └──► TokenStore  (pluggable token persistence)
//!        └──► CircuitBreaker   (consecutive-failure gate, lazy close)
//! ```
//!
//! The token service refreshes access tokens proactively (before the 120 s
//! expiry buffer elapses) and reactively (after a 401), de-duplicating
//! concurrent refresh attempts into a single backend call. The circuit
//! breaker trips after a run of consecutive failures and broadcasts a
//! "service unavailable" flag that a connectivity gate can watch.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use storefront_client::auth::{HttpRefreshClient, MemoryTokenStore, TokenService};
//! use storefront_client::client::ApiClient;
//! use storefront_client::config::ApiConfig;
//! use storefront_client::resilience::CircuitBreaker;
//! use storefront_client::services::CatalogApi;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiConfig::new("https://api.storefront.example");
//! let store = Arc::new(MemoryTokenStore::new());
//! let refresh = HttpRefreshClient::new(&config)?;
//! let tokens = Arc::new(TokenService::new(refresh, store));
//! let breaker = Arc::new(CircuitBreaker::with_defaults());
//!
//! tokens.set_auth_failure_listener(|| {
//!     // force logout / navigation reset
//! });
//!
//! let client = Arc::new(ApiClient::new(config, tokens, breaker)?);
//! let products = CatalogApi::new(client).products().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod resilience;
pub mod services;
pub mod testing;

pub use auth::{
    is_token_expired, HttpRefreshClient, MemoryTokenStore, RefreshClient, RefreshError,
    RefreshedTokens, StoreError, TokenKind, TokenService, TokenStore,
};
pub use client::ApiClient;
pub use config::ApiConfig;
pub use error::ApiError;
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, Clock, MockClock, SystemClock};
