//! Session lifecycle state.

use serde::{Deserialize, Serialize};

/// Where the client's session currently stands.
///
/// `Authenticated -> Refreshing -> {Authenticated, LoggedOut}`. `LoggedOut`
/// only moves again when a new login stores credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No credentials have been stored yet.
    #[default]
    Anonymous,
    /// Credentials are stored and believed usable.
    Authenticated,
    /// A refresh episode is in flight.
    Refreshing,
    /// The session ended; a new login is required.
    LoggedOut,
}

impl SessionState {
    /// Check if requests are expected to carry a credential.
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Refreshing)
    }

    /// Get a user-friendly message.
    #[must_use]
    pub const fn message(&self) -> &str {
        match self {
            Self::Anonymous => "Not logged in",
            Self::Authenticated => "Logged in",
            Self::Refreshing => "Renewing session...",
            Self::LoggedOut => "Session ended, please log in again",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_credentials() {
        assert!(!SessionState::Anonymous.has_credentials());
        assert!(SessionState::Authenticated.has_credentials());
        assert!(SessionState::Refreshing.has_credentials());
        assert!(!SessionState::LoggedOut.has_credentials());
    }
}
