//! Adapter wiring.

use std::sync::Arc;

use portal_application::{
    AuthenticatedClient, CredentialStore, HttpTransport, RefreshCoordinator, SessionManager,
    SessionObserver, SessionTracker,
};
use portal_domain::{ClientSettings, SessionState};
use portal_infrastructure::{FileCredentialStore, ReqwestTransport};

use crate::error::AppError;

/// One client instance: a transport, a credential file and the session
/// they share.
///
/// The refresh coordinator behind [`Portal::client`] is scoped to this
/// instance, so two `Portal`s never coordinate with each other.
pub struct Portal {
    settings: ClientSettings,
    store: Arc<FileCredentialStore>,
    client: AuthenticatedClient,
    sessions: SessionManager,
}

impl Portal {
    /// Builds the client for `settings`, reporting session ends to `observer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid, the HTTP client cannot
    /// be built, or there is nowhere to keep credentials.
    pub fn new(
        settings: ClientSettings,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, AppError> {
        settings.validate()?;

        let path = match &settings.credentials_file {
            Some(path) => path.clone(),
            None => FileCredentialStore::default_path().ok_or(AppError::NoDataDir)?,
        };
        let store = Arc::new(FileCredentialStore::new(path));
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(settings.clone())?);
        let session = Arc::new(SessionTracker::new(SessionState::Anonymous));

        let credentials: Arc<dyn CredentialStore> = store.clone();
        let refresher = Arc::new(RefreshCoordinator::new(
            Arc::clone(&credentials),
            Arc::clone(&transport),
            Arc::clone(&session),
            &settings,
        ));
        let client = AuthenticatedClient::new(
            Arc::clone(&transport),
            Arc::clone(&credentials),
            refresher,
            observer,
            Arc::clone(&session),
        );
        let sessions = SessionManager::new(transport, credentials, session, &settings);

        tracing::debug!(
            base_url = %settings.base_url,
            credentials = %store.path().display(),
            "client ready"
        );

        Ok(Self {
            settings,
            store,
            client,
            sessions,
        })
    }

    /// Returns the effective settings.
    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Returns the credential file backing this instance.
    #[must_use]
    pub fn store(&self) -> &FileCredentialStore {
        &self.store
    }

    /// Returns the authenticated client.
    #[must_use]
    pub const fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Returns the login/logout entry points.
    #[must_use]
    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("base_url", &self.settings.base_url)
            .field("credentials", &self.store.path())
            .finish_non_exhaustive()
    }
}
