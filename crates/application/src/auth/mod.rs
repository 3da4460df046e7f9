//! Authentication module for the Portal API client.
//!
//! This module provides:
//! - The authenticated client every consumer goes through
//! - Single-flight refresh coordination
//! - Login/logout and shared session state
//! - In-memory credential storage

mod client;
mod coordinator;
mod memory_store;
mod session;
mod session_manager;

pub use client::{AuthenticatedClient, ClientError};
pub use coordinator::{RefreshCoordinator, TokenRefresher};
pub use memory_store::MemoryCredentialStore;
pub use session::SessionTracker;
pub use session_manager::{LoginError, SessionManager};
