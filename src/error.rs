//! API error taxonomy.
//!
//! Every failure branch of the request pipeline resolves to one of these
//! variants. `user_message` maps each variant to the human-readable string
//! the UI layer presents.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::StoreError;

/// Errors surfaced by the API client pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The circuit breaker is open; the request was rejected locally without
    /// reaching the network. Carries the remaining cooldown.
    #[error("Circuit open. Retry available in {}s", .retry_in.as_millis().div_ceil(1000))]
    CircuitOpen { retry_in: Duration },

    /// The backend answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// The request never produced a response (connect, timeout, cancellation).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Token persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request or response body could not be (de)serialized.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status of the failure, when one exists.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Human-readable message for the UI layer.
    ///
    /// Server-provided messages win when present; transport failures map to
    /// a generic connectivity hint.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::CircuitOpen { .. } => self.to_string(),
            Self::Status { message, .. } if !message.is_empty() => message.clone(),
            Self::Status { .. } => "Server error occurred.".to_string(),
            Self::Transport(_) => "Network error. Please check your connection.".to_string(),
            Self::Store(_) | Self::InvalidRequest(_) => {
                "An unexpected error occurred.".to_string()
            }
        }
    }
}
