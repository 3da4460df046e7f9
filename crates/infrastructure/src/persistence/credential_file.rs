//! File-based credential store.
//!
//! Credentials are stored as a small JSON document holding the two slots
//! `accessToken` and `refreshToken`:
//! ```json
//! {
//!   "accessToken": "eyJhbGciOi...",
//!   "refreshToken": "d41d8cd98f..."
//! }
//! ```
//! The file is replaced with a rename, never edited in place, so a reader
//! sees either the previous document or the new one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use portal_application::ports::{CredentialStore, CredentialStoreError};
use portal_domain::CredentialPair;

use crate::serialization::{from_json_bytes, to_json_pretty_bytes};

/// On-disk layout. Either slot may be missing in a hand-edited or foreign file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSlots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// Credential store backed by a JSON file.
///
/// Every read goes to disk, so a pair written by another process is picked
/// up on the next request.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store persisting to `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default location: `<data dir>/portal/credentials.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("portal").join("credentials.json"))
    }

    /// Returns the path this store persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Picks a sibling temp name unique to this process and write.
    fn temp_path(&self) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = self
            .path
            .file_name()
            .map_or_else(|| "credentials".into(), |n| n.to_string_lossy());
        self.path
            .with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
    }

    async fn load(&self) -> Result<Option<CredentialPair>, CredentialStoreError> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let slots: StoredSlots = from_json_bytes(&content)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;

        match (slots.access_token, slots.refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() => {
                Ok(Some(CredentialPair::new(access, refresh)))
            }
            _ => {
                debug!(path = %self.path.display(), "credential file holds an incomplete pair");
                Ok(None)
            }
        }
    }

    async fn write_restricted(path: &Path, content: &[u8]) -> std::io::Result<()> {
        use tokio::io::AsyncWriteExt;

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(path).await?;
        file.write_all(content).await?;
        file.sync_all().await
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn read(&self) -> Option<CredentialPair> {
        match self.load().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable credential file");
                None
            }
        }
    }

    async fn write(&self, pair: &CredentialPair) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let slots = StoredSlots {
            access_token: Some(pair.access_token.clone()),
            refresh_token: Some(pair.refresh_token.clone()),
        };
        let content = to_json_pretty_bytes(&slots)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;

        let temp = self.temp_path();
        if let Err(e) = Self::write_restricted(&temp, &content).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
