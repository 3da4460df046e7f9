//! Authentication domain types

mod credential;
mod outcome;
mod payload;
mod session;

pub use credential::{CredentialPair, token_preview};
pub use outcome::{RefreshFailure, RefreshOutcome, SettledRefresh};
pub use payload::{LoginRequest, RefreshRequest, RefreshResponse};
pub use session::SessionState;
