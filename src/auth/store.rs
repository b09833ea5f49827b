//! Token persistence abstraction.
//!
//! The store is an external collaborator: platform integrations back it with
//! durable key-value storage (keychain, encrypted preferences). The bundled
//! [`MemoryTokenStore`] covers tests and short-lived processes. Concurrent
//! writes are last-write-wins.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

/// Which token a store operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Short-lived credential sent with each protected request.
    Access,
    /// Longer-lived credential used solely to mint a new access token.
    Refresh,
}

/// Error from a token store backend.
#[derive(Debug, Clone, Error)]
#[error("token store error: {0}")]
pub struct StoreError(pub String);

/// Async key-value persistence for the token pair.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read a token, `None` when absent.
    async fn get(&self, kind: TokenKind) -> Result<Option<String>, StoreError>;

    /// Write a token, replacing any previous value.
    async fn set(&self, kind: TokenKind, value: &str) -> Result<(), StoreError>;

    /// Delete one token.
    async fn clear(&self, kind: TokenKind) -> Result<(), StoreError>;

    /// Delete all stored auth data.
    async fn clear_all(&self) -> Result<(), StoreError>;
}

/// In-process token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<TokenKind, String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, kind: TokenKind) -> Result<Option<String>, StoreError> {
        Ok(self.tokens.read().get(&kind).cloned())
    }

    async fn set(&self, kind: TokenKind, value: &str) -> Result<(), StoreError> {
        self.tokens.write().insert(kind, value.to_string());
        Ok(())
    }

    async fn clear(&self, kind: TokenKind) -> Result<(), StoreError> {
        self.tokens.write().remove(&kind);
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.tokens.write().clear();
        Ok(())
    }
}
