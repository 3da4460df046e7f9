//! JSON bodies exchanged with the `/auth` endpoints.

use serde::{Deserialize, Serialize};

use super::credential::CredentialPair;

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token being exchanged.
    pub refresh_token: String,
}

/// Success body of `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// The newly issued access token.
    pub access_token: String,
    /// A rotated refresh token, when the server issues one.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl RefreshResponse {
    /// Builds the pair to store, keeping `previous_refresh` when the server
    /// did not rotate the refresh token.
    ///
    /// Returns `None` when the access token is empty.
    #[must_use]
    pub fn into_pair(self, previous_refresh: &str) -> Option<CredentialPair> {
        if self.access_token.is_empty() {
            return None;
        }
        let refresh = self
            .refresh_token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| previous_refresh.to_string());
        Some(CredentialPair::new(self.access_token, refresh))
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}
