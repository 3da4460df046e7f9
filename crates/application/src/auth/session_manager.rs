//! Login and logout.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use portal_domain::{
    ClientSettings, CredentialPair, HttpMethod, LoginRequest, RequestEnvelope, SessionState,
};

use super::session::SessionTracker;
use crate::ports::{CredentialStore, CredentialStoreError, HttpTransport, TransportError};

/// Errors that can occur while logging in or out.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The login request never got a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server refused the credentials.
    #[error("login rejected with status {status}")]
    Rejected {
        /// Response status.
        status: u16,
    },

    /// The server accepted the login but returned an unusable body.
    #[error("malformed login response: {0}")]
    Malformed(String),

    /// The credentials could not be persisted or removed.
    #[error(transparent)]
    Storage(#[from] CredentialStoreError),
}

/// Populates and clears the credential store on behalf of the host.
pub struct SessionManager {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    session: Arc<SessionTracker>,
    login_path: String,
}

impl SessionManager {
    /// Create a session manager that logs in at `settings.login_path`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
        session: Arc<SessionTracker>,
        settings: &ClientSettings,
    ) -> Self {
        Self {
            transport,
            store,
            session,
            login_path: settings.login_path.clone(),
        }
    }

    /// Exchanges email and password for a credential pair and stores it.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the login, answers with an
    /// unusable body, or the pair cannot be stored. The store is unchanged
    /// in every error case except a storage failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<CredentialPair, LoginError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = RequestEnvelope::json(HttpMethod::Post, &self.login_path, &body)
            .map_err(|e| LoginError::Malformed(e.to_string()))?
            .with_default_content_type();

        let response = self.transport.send(&request).await?;
        if !response.is_success() {
            return Err(LoginError::Rejected {
                status: response.status.as_u16(),
            });
        }

        let pair: CredentialPair = response
            .json()
            .map_err(|e| LoginError::Malformed(e.to_string()))?;
        if pair.is_incomplete() {
            return Err(LoginError::Malformed("missing token".to_string()));
        }

        {
            let _commit = self.session.lock_credentials().await;
            self.store.write(&pair).await?;
            self.session.set(SessionState::Authenticated);
        }
        info!(email, "logged in");
        Ok(pair)
    }

    /// Clears stored credentials. Logging out twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared.
    pub async fn logout(&self) -> Result<(), LoginError> {
        {
            let _commit = self.session.lock_credentials().await;
            self.store.clear().await?;
            self.session.set(SessionState::LoggedOut);
        }
        info!("logged out");
        Ok(())
    }

    /// Returns the session state, reconciled with what is actually stored.
    ///
    /// Credentials written by an earlier process count as `Authenticated`;
    /// an empty store is `Anonymous` unless this process ended the session.
    pub async fn status(&self) -> SessionState {
        let stored = self.store.read().await.is_some();
        let current = self.session.current();
        let reconciled = if stored == current.has_credentials() {
            current
        } else if stored {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        self.session.set(reconciled);
        reconciled
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}
