//! Portal Domain - Core types
//!
//! This crate defines the domain model for the Portal API client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod request;
pub mod response;
pub mod settings;

pub use auth::{
    CredentialPair, LoginRequest, RefreshFailure, RefreshOutcome, RefreshRequest, RefreshResponse,
    SessionState, SettledRefresh, token_preview,
};
pub use error::{DomainError, DomainResult};
pub use request::{HttpMethod, RequestEnvelope};
pub use response::{ResponseEnvelope, StatusCode};
pub use settings::ClientSettings;
