//! Persistence implementations for file-based storage.

mod credential_file;
mod settings_repository;

pub use credential_file::FileCredentialStore;
pub use settings_repository::{SettingsError, SettingsRepository};
