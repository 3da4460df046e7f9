//! The authenticated API client.
//!
//! This is the only entry point pages and commands use to reach the
//! backend. It attaches the stored access token, renews it once on a 401,
//! and ends the session when renewal is impossible.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use portal_domain::{
    HttpMethod, RefreshFailure, RefreshOutcome, RequestEnvelope, ResponseEnvelope, SessionState,
};

use super::coordinator::TokenRefresher;
use super::session::SessionTracker;
use crate::ports::{CredentialStore, HttpTransport, SessionObserver, TransportError};

/// Errors surfaced by [`AuthenticatedClient::request`].
///
/// An expired session is not one of them: callers get the original 401
/// response instead.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The primary request or its replay never got a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Issues requests with the stored bearer credential, renewing it on expiry.
pub struct AuthenticatedClient {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    observer: Arc<dyn SessionObserver>,
    session: Arc<SessionTracker>,
}

impl AuthenticatedClient {
    /// Create a client from its collaborators.
    ///
    /// `refresher` must renew credentials in the same `store`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        observer: Arc<dyn SessionObserver>,
        session: Arc<SessionTracker>,
    ) -> Self {
        Self {
            transport,
            store,
            refresher,
            observer,
            session,
        }
    }

    /// Returns the shared session tracker.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionTracker> {
        &self.session
    }

    /// Sends `envelope` with the current access token.
    ///
    /// Any status other than 401 is returned untouched. A 401 on a request
    /// that carried a token triggers one refresh and, if it succeeds, one
    /// replay whose response is returned as is. If the refresh fails the
    /// session is ended and the original 401 is returned. If the user logged
    /// out or in while the refresh was pending, the original 401 is returned
    /// and the session is left as they set it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the request or its replay got
    /// no response. Such errors are never retried.
    pub async fn request(&self, envelope: &RequestEnvelope) -> Result<ResponseEnvelope, ClientError> {
        let token = self
            .store
            .access_token()
            .await
            .filter(|token| !token.is_empty());
        let outbound = match token.as_deref() {
            Some(token) => envelope.with_bearer(token),
            None => envelope.clone(),
        }
        .with_default_content_type();

        debug!(method = %outbound.method(), path = outbound.path(), authenticated = token.is_some(), "sending request");
        let response = self.transport.send(&outbound).await?;

        if !response.status.is_unauthorized() || token.is_none() {
            return Ok(response);
        }

        let settled = self.refresher.refresh().await;
        match settled.outcome {
            RefreshOutcome::Success(pair) => {
                debug!(
                    episode = settled.episode,
                    method = %outbound.method(),
                    path = outbound.path(),
                    "replaying request with refreshed token"
                );
                let replay = outbound.with_bearer(&pair.access_token);
                Ok(self.transport.send(&replay).await?)
            }
            RefreshOutcome::Failure(RefreshFailure::Superseded) => {
                debug!(
                    episode = settled.episode,
                    "credentials changed during refresh, returning original response"
                );
                Ok(response)
            }
            RefreshOutcome::Failure(_) | RefreshOutcome::NoCredential => {
                self.end_session(settled.episode).await;
                Ok(response)
            }
        }
    }

    /// Sends a `GET` request.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn get(&self, path: &str) -> Result<ResponseEnvelope, ClientError> {
        self.request(&RequestEnvelope::get(path)).await
    }

    /// Sends a `DELETE` request.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn delete(&self, path: &str) -> Result<ResponseEnvelope, ClientError> {
        self.request(&RequestEnvelope::delete(path)).await
    }

    /// Sends a `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] if `body` cannot be serialised, and
    /// otherwise see [`AuthenticatedClient::request`].
    pub async fn post_json<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ResponseEnvelope, ClientError> {
        self.request(&RequestEnvelope::json(HttpMethod::Post, path, body)?)
            .await
    }

    /// Sends a `PUT` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] if `body` cannot be serialised, and
    /// otherwise see [`AuthenticatedClient::request`].
    pub async fn put_json<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ResponseEnvelope, ClientError> {
        self.request(&RequestEnvelope::json(HttpMethod::Put, path, body)?)
            .await
    }

    /// Clears credentials and signals the host, once per failed episode.
    async fn end_session(&self, episode: u64) {
        if !self.session.claim_end(episode) {
            debug!(episode, "session already ended for this episode");
            return;
        }

        {
            let _commit = self.session.lock_credentials().await;
            if let Err(e) = self.store.clear().await {
                warn!(episode, error = %e, "failed to clear stored credentials");
            }
            self.session.set(SessionState::LoggedOut);
        }

        if self.observer.is_at_login() {
            debug!(episode, "already at login, not signalling session end");
        } else {
            warn!(episode, "session could not be renewed, login required");
            self.observer.session_ended(episode);
        }
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("session", &self.session.current())
            .finish_non_exhaustive()
    }
}
