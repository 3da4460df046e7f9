//! Portal Application - Authenticated client and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for storage, transport and host navigation)
//! - The authenticated client and its single-flight refresh coordinator
//! - Application-level error handling

pub mod auth;
pub mod error;
pub mod ports;

pub use auth::{
    AuthenticatedClient, ClientError, LoginError, MemoryCredentialStore, RefreshCoordinator,
    SessionManager, SessionTracker, TokenRefresher,
};
pub use error::{ApplicationError, ApplicationResult};
pub use ports::{
    CredentialStore, CredentialStoreError, HttpTransport, SessionObserver, TransportError,
};
