//! Application error types

use thiserror::Error;

use portal_domain::DomainError;

use crate::auth::{ClientError, LoginError};
use crate::ports::{CredentialStoreError, TransportError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A request could not be delivered.
    #[error("HTTP error: {0}")]
    Transport(#[from] TransportError),

    /// An authenticated request failed.
    #[error("request failed: {0}")]
    Client(#[from] ClientError),

    /// Logging in or out failed.
    #[error("session error: {0}")]
    Login(#[from] LoginError),

    /// A credential storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] CredentialStoreError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
