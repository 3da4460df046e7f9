//! Errors reported by the command-line host.

use thiserror::Error;

use portal_application::{ApplicationError, ClientError, LoginError, TransportError};
use portal_domain::DomainError;
use portal_infrastructure::SettingsError;

/// Anything that stops a command from completing.
#[derive(Debug, Error)]
pub enum AppError {
    /// Settings could not be loaded or are invalid.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The client failed: bad input, no response, or a failed login.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// A `--header` argument is not of the form `Name: value`.
    #[error("invalid header '{0}', expected 'Name: value'")]
    InvalidHeader(String),

    /// No credentials file was configured and no data directory exists.
    #[error("could not determine where to store credentials, pass --credentials")]
    NoDataDir,
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        Self::Application(e.into())
    }
}

impl From<TransportError> for AppError {
    fn from(e: TransportError) -> Self {
        Self::Application(e.into())
    }
}

impl From<ClientError> for AppError {
    fn from(e: ClientError) -> Self {
        Self::Application(e.into())
    }
}

impl From<LoginError> for AppError {
    fn from(e: LoginError) -> Self {
        Self::Application(e.into())
    }
}
