//! Client settings persistence.
//!
//! Stores client settings in the platform-specific config directory:
//! - Linux: ~/.config/portal/settings.json
//! - macOS: ~/Library/Application Support/portal/settings.json
//! - Windows: %APPDATA%/portal/settings.json

use std::path::PathBuf;

use tokio::fs;
use portal_domain::{ClientSettings, DomainError};

use crate::serialization::{SerializationError, from_json_bytes, to_json_pretty_bytes};

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// The settings file holds unusable values.
    #[error("Invalid settings: {0}")]
    Invalid(#[from] DomainError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Repository for client settings persistence.
#[derive(Debug, Clone, Default)]
pub struct SettingsRepository {
    path: Option<PathBuf>,
}

impl SettingsRepository {
    /// Creates a repository using the platform config directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    /// Creates a repository reading and writing `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Returns `<config dir>/portal/settings.json`, if a config dir exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("portal").join("settings.json"))
    }

    /// Returns the path where settings are stored, if available.
    #[must_use]
    pub const fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Loads and validates client settings.
    ///
    /// Returns default settings if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds
    /// invalid values.
    pub async fn load(&self) -> Result<ClientSettings, SettingsError> {
        let Some(path) = &self.path else {
            return Ok(ClientSettings::default());
        };

        let content = match fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ClientSettings::default());
            }
            Err(e) => return Err(e.into()),
        };

        let settings: ClientSettings = from_json_bytes(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Saves client settings to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or cannot be written.
    pub async fn save(&self, settings: &ClientSettings) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Err(SettingsError::NoConfigDir);
        };
        settings.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = to_json_pretty_bytes(settings)?;
        fs::write(path, content).await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn settings_path_is_valid() {
        if let Some(p) = SettingsRepository::default_path() {
            assert!(p.ends_with("portal/settings.json"));
        }
    }

    #[tokio::test]
    async fn load_returns_default_when_no_file() {
        let dir = tempdir().unwrap();
        let repo = SettingsRepository::at(dir.path().join("settings.json"));
        assert_eq!(repo.load().await.unwrap(), ClientSettings::default());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempdir().unwrap();
        let repo = SettingsRepository::at(dir.path().join("nested").join("settings.json"));
        let settings = ClientSettings {
            base_url: "https://erp.example.com/api".to_string(),
            timeout_ms: 5_000,
            ..ClientSettings::default()
        };

        repo.save(&settings).await.unwrap();

        assert_eq!(repo.load().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn load_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"timeout_ms": 0}"#).unwrap();

        let result = SettingsRepository::at(&path).load().await;

        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }
}
