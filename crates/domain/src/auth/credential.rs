//! The access/refresh credential pair.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An access token and the refresh token issued alongside it.
///
/// Both halves are opaque bearer strings. A pair is always stored and
/// replaced as a whole.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    /// Short-lived token attached to every request.
    pub access_token: String,
    /// Longer-lived token used only to mint a new access token.
    pub refresh_token: String,
}

impl CredentialPair {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Returns true if either half is empty.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.access_token.is_empty() || self.refresh_token.is_empty()
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &token_preview(&self.access_token))
            .field("refresh_token", &token_preview(&self.refresh_token))
            .finish()
    }
}

/// Get a preview of a token (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() > 12 {
        let head: String = token.chars().take(8).collect();
        format!("{head}...")
    } else {
        token.to_string()
    }
}
