//! Credential store port
//!
//! Defines the interface for credential persistence.

use async_trait::async_trait;

use portal_domain::CredentialPair;

/// Errors that can occur while persisting credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// The single owner of the persisted credential pair.
///
/// Implementations must swap both halves of the pair together: a reader
/// never sees the access token of one pair next to the refresh token of
/// another. `read` must consult the backing medium each time, since another
/// process may have written it since the last call.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the stored pair, or `None` if nothing usable is stored.
    ///
    /// Never fails; unreadable storage is reported as empty.
    async fn read(&self) -> Option<CredentialPair>;

    /// Persists both halves of `pair` atomically.
    ///
    /// # Errors
    /// Returns an error if the pair cannot be persisted. The previous pair
    /// is left in place in that case.
    async fn write(&self, pair: &CredentialPair) -> Result<(), CredentialStoreError>;

    /// Removes both halves. Clearing an empty store succeeds.
    ///
    /// # Errors
    /// Returns an error if the backing medium cannot be updated.
    async fn clear(&self) -> Result<(), CredentialStoreError>;

    /// Returns the stored access token.
    async fn access_token(&self) -> Option<String> {
        self.read().await.map(|pair| pair.access_token)
    }

    /// Returns the stored refresh token.
    async fn refresh_token(&self) -> Option<String> {
        self.read().await.map(|pair| pair.refresh_token)
    }
}
