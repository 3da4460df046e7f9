//! Refresh episode outcomes.

use thiserror::Error;

use super::credential::CredentialPair;

/// Why a refresh attempt did not produce a new credential pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    /// The refresh call never got a response.
    #[error("refresh transport error: {0}")]
    Transport(String),

    /// The refresh endpoint answered with a non-2xx status.
    #[error("refresh rejected with status {0}")]
    Status(u16),

    /// The refresh endpoint answered 2xx with an unusable body.
    #[error("malformed refresh response: {0}")]
    Malformed(String),

    /// The refresh call exceeded the request timeout.
    #[error("refresh timed out after {timeout_ms} ms")]
    TimedOut {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The new pair could not be persisted.
    #[error("failed to store refreshed credentials: {0}")]
    Storage(String),

    /// The stored credentials were replaced or cleared while the refresh
    /// call was pending, so its result was discarded.
    #[error("credentials changed while refreshing")]
    Superseded,

    /// The episode ended without publishing a result.
    #[error("refresh aborted before settling")]
    Aborted,
}

/// Result of one refresh episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new pair was obtained and stored.
    Success(CredentialPair),
    /// The attempt failed; stored credentials were left untouched.
    Failure(RefreshFailure),
    /// No refresh token was stored, so nothing was attempted.
    NoCredential,
}

/// An outcome tagged with the episode that produced it.
///
/// Every caller that overlapped the same episode receives an equal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledRefresh {
    /// Monotonic episode number, starting at 1.
    pub episode: u64,
    /// What the episode produced.
    pub outcome: RefreshOutcome,
}
