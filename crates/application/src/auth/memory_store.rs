//! In-memory credential storage.
//!
//! Useful for tests and for hosts that do not want credentials to outlive
//! the process.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use portal_domain::CredentialPair;

use crate::ports::{CredentialStore, CredentialStoreError};

/// Thread-safe in-memory credential store.
///
/// The pair lives behind a single lock and is replaced as a whole.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    pair: Arc<RwLock<Option<CredentialPair>>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `pair`.
    #[must_use]
    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            pair: Arc::new(RwLock::new(Some(pair))),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn read(&self) -> Option<CredentialPair> {
        self.pair.read().await.clone()
    }

    async fn write(&self, pair: &CredentialPair) -> Result<(), CredentialStoreError> {
        *self.pair.write().await = Some(pair.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        self.pair.write().await.take();
        Ok(())
    }
}
