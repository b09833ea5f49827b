//! Authentication continuity: token persistence, expiry checks, and
//! coordinated refresh.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ TokenService  │  Expiry validation + single-flight refresh
//! └──────┬────────┘
//!        ├──► RefreshClient  (POST /auth/refresh, 15 s timeout)
//!        └──► TokenStore     (pluggable access/refresh persistence)
//! ```
//!
//! The failure asymmetry is deliberate: only an *authoritative* rejection of
//! the refresh call (401/403, or no refresh token at all) ends the session
//! by clearing stored credentials and firing the auth-failure listener.
//! Ambiguous failures (network errors, malformed payloads) resolve to `None`
//! and leave the session intact so the caller can retry later.

pub mod refresh;
pub mod service;
pub mod store;

pub use refresh::{HttpRefreshClient, RefreshClient, RefreshError, RefreshedTokens};
pub use service::{is_token_expired, TokenService};
pub use store::{MemoryTokenStore, StoreError, TokenKind, TokenStore};
