//! Client Settings Domain Model
//!
//! Defines how the client reaches the portal backend.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
/// Default refresh endpoint path.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
/// Default login endpoint path.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Settings for the authenticated client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL every request path is appended to.
    pub base_url: String,
    /// Path of the token refresh endpoint.
    pub refresh_path: String,
    /// Path of the login endpoint.
    pub login_path: String,
    /// Timeout applied to every request, the refresh call included.
    pub timeout_ms: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Where credentials are persisted. `None` uses the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: concat!("Portal/", env!("CARGO_PKG_VERSION")).to_string(),
            credentials_file: None,
        }
    }
}

impl ClientSettings {
    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolves a request path against the base URL.
    ///
    /// The path is appended to the base URL's path rather than replacing it,
    /// so `/vendors` under `http://host/api` becomes `http://host/api/vendors`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if the result does not parse.
    pub fn endpoint_url(&self, path: &str) -> DomainResult<Url> {
        let base = self.base_url.trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        Url::parse(&joined).map_err(|e| DomainError::InvalidUrl(format!("{e}: {joined}")))
    }

    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSetting`] for the first bad value found.
    pub fn validate(&self) -> DomainResult<()> {
        let base = Url::parse(&self.base_url).map_err(|e| DomainError::InvalidSetting {
            name: "base_url",
            message: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(DomainError::InvalidSetting {
                name: "base_url",
                message: format!("unsupported scheme `{}`", base.scheme()),
            });
        }
        for (name, path) in [
            ("refresh_path", &self.refresh_path),
            ("login_path", &self.login_path),
        ] {
            if !path.starts_with('/') {
                return Err(DomainError::InvalidSetting {
                    name,
                    message: format!("`{path}` must start with `/`"),
                });
            }
        }
        if self.timeout_ms == 0 {
            return Err(DomainError::InvalidSetting {
                name: "timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        let settings = ClientSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_endpoint_url_appends_to_base_path() {
        let settings = ClientSettings {
            base_url: "https://portal.example.com/api/".to_string(),
            ..ClientSettings::default()
        };
        assert_eq!(
            settings.endpoint_url("/auth/refresh").unwrap().as_str(),
            "https://portal.example.com/api/auth/refresh"
        );
        assert_eq!(
            settings.endpoint_url("vendors?page=2").unwrap().as_str(),
            "https://portal.example.com/api/vendors?page=2"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_path = ClientSettings {
            refresh_path: "auth/refresh".to_string(),
            ..ClientSettings::default()
        };
        assert!(matches!(
            bad_path.validate(),
            Err(DomainError::InvalidSetting { name: "refresh_path", .. })
        ));

        let zero_timeout = ClientSettings {
            timeout_ms: 0,
            ..ClientSettings::default()
        };
        assert!(zero_timeout.validate().is_err());

        let ftp = ClientSettings {
            base_url: "ftp://example.com".to_string(),
            ..ClientSettings::default()
        };
        assert!(ftp.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"base_url": "https://erp.example.com"}"#).unwrap();
        assert_eq!(settings.base_url, "https://erp.example.com");
        assert_eq!(settings.refresh_path, DEFAULT_REFRESH_PATH);
    }
}
