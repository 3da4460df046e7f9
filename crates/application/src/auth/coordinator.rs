//! Single-flight token refresh.
//!
//! Any number of tasks may ask for a refresh at the same time. The first one
//! starts a refresh episode; everyone who arrives while it is pending waits
//! for the same result. The episode runs on its own task, so a caller that
//! gives up waiting does not cancel it for the others.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use portal_domain::{
    ClientSettings, CredentialPair, HttpMethod, RefreshFailure, RefreshOutcome, RefreshRequest,
    RefreshResponse, RequestEnvelope, SessionState, SettledRefresh, token_preview,
};

use super::session::SessionTracker;
use crate::ports::{CredentialStore, HttpTransport};

type Pending = watch::Receiver<Option<SettledRefresh>>;

/// Something that can renew the stored credentials on demand.
///
/// [`RefreshCoordinator`] is the production implementation; the
/// authenticated client only depends on this trait.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Renews the stored credentials, or joins a renewal already in flight.
    async fn refresh(&self) -> SettledRefresh;
}

/// Deduplicates concurrent refresh attempts into one outcome per episode.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn CredentialStore>,
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionTracker>,
    refresh_path: String,
    timeout: Duration,
    /// The only handle to the pending episode. `Some` exactly while one is in flight.
    in_flight: Mutex<Option<Pending>>,
    episodes: AtomicU64,
}

impl RefreshCoordinator {
    /// Create a coordinator that posts to `settings.refresh_path` and gives
    /// up after `settings.timeout()`.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn HttpTransport>,
        session: Arc<SessionTracker>,
        settings: &ClientSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                session,
                refresh_path: settings.refresh_path.clone(),
                timeout: settings.timeout(),
                in_flight: Mutex::new(None),
                episodes: AtomicU64::new(0),
            }),
        }
    }

    /// Renews the stored credentials, or joins the renewal already in flight.
    ///
    /// All calls that overlap one episode return equal values.
    pub async fn refresh(&self) -> SettledRefresh {
        let mut pending = self.join_or_start();
        let settled = match pending.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        };
        // The settlement always publishes before dropping its sender, so
        // this only triggers if the runtime is tearing down.
        settled.unwrap_or_else(|| SettledRefresh {
            episode: self.inner.episodes.load(Ordering::Acquire),
            outcome: RefreshOutcome::Failure(RefreshFailure::Aborted),
        })
    }

    /// Returns true while an episode is pending.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    /// Returns how many episodes have been started so far.
    #[must_use]
    pub fn episodes_started(&self) -> u64 {
        self.inner.episodes.load(Ordering::Acquire)
    }

    fn join_or_start(&self) -> Pending {
        let mut slot = self.inner.in_flight.lock();
        if let Some(pending) = slot.as_ref() {
            return pending.clone();
        }

        let (tx, rx) = watch::channel(None);
        *slot = Some(rx.clone());
        let episode = self.inner.episodes.fetch_add(1, Ordering::AcqRel) + 1;
        drop(slot);

        let mut settlement = Settlement {
            inner: Arc::clone(&self.inner),
            tx,
            episode,
            outcome: None,
        };
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            settlement.outcome = Some(inner.run_episode(episode).await);
        });

        rx
    }
}

#[async_trait]
impl TokenRefresher for RefreshCoordinator {
    async fn refresh(&self) -> SettledRefresh {
        Self::refresh(self).await
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_path", &self.inner.refresh_path)
            .field("timeout", &self.inner.timeout)
            .field("refreshing", &self.is_refreshing())
            .field("episodes", &self.episodes_started())
            .finish_non_exhaustive()
    }
}

impl Inner {
    async fn run_episode(&self, episode: u64) -> RefreshOutcome {
        let current = {
            let _commit = self.session.lock_credentials().await;
            let Some(current) = self
                .store
                .read()
                .await
                .filter(|pair| !pair.refresh_token.is_empty())
            else {
                info!(episode, "no refresh token stored, skipping refresh");
                return RefreshOutcome::NoCredential;
            };
            self.session.set(SessionState::Refreshing);
            current
        };
        info!(
            episode,
            refresh_token = %token_preview(&current.refresh_token),
            "refreshing access token"
        );

        let committed = match self.exchange(&current).await {
            Ok(pair) => self.commit(&current, pair).await,
            Err(reason) => Err(reason),
        };
        match committed {
            Ok(pair) => {
                info!(episode, access_token = %token_preview(&pair.access_token), "access token refreshed");
                RefreshOutcome::Success(pair)
            }
            Err(RefreshFailure::Superseded) => {
                info!(episode, "credentials changed while refreshing, discarding new pair");
                RefreshOutcome::Failure(RefreshFailure::Superseded)
            }
            Err(reason) => {
                warn!(episode, %reason, "access token refresh failed");
                RefreshOutcome::Failure(reason)
            }
        }
    }

    /// Trades the current refresh token for a new pair.
    async fn exchange(&self, current: &CredentialPair) -> Result<CredentialPair, RefreshFailure> {
        let body = RefreshRequest {
            refresh_token: current.refresh_token.clone(),
        };
        let request = RequestEnvelope::json(HttpMethod::Post, &self.refresh_path, &body)
            .map_err(|e| RefreshFailure::Malformed(e.to_string()))?
            .with_default_content_type();

        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let response = match tokio::time::timeout(self.timeout, self.transport.send(&request)).await
        {
            Err(_) => return Err(RefreshFailure::TimedOut { timeout_ms }),
            Ok(Err(e)) if e.is_timeout() => return Err(RefreshFailure::TimedOut { timeout_ms }),
            Ok(Err(e)) => return Err(RefreshFailure::Transport(e.to_string())),
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            return Err(RefreshFailure::Status(response.status.as_u16()));
        }

        response
            .json::<RefreshResponse>()
            .map_err(|e| RefreshFailure::Malformed(e.to_string()))?
            .into_pair(&current.refresh_token)
            .ok_or_else(|| RefreshFailure::Malformed("empty access token".to_string()))
    }

    /// Stores `pair` unless the credentials `current` was read from have
    /// since been replaced or cleared.
    async fn commit(
        &self,
        current: &CredentialPair,
        pair: CredentialPair,
    ) -> Result<CredentialPair, RefreshFailure> {
        let _commit = self.session.lock_credentials().await;
        if self.store.refresh_token().await.as_deref() != Some(current.refresh_token.as_str()) {
            return Err(RefreshFailure::Superseded);
        }

        self.store
            .write(&pair)
            .await
            .map_err(|e| RefreshFailure::Storage(e.to_string()))?;
        self.session.set(SessionState::Authenticated);

        Ok(pair)
    }
}

/// Publishes an episode's outcome and frees the in-flight slot.
///
/// Both happen in one critical section when this is dropped, whether the
/// episode finished, panicked, or its task was dropped by the runtime. A
/// caller taking the lock afterwards starts a new episode; one that took it
/// before already holds a receiver that will see the outcome.
struct Settlement {
    inner: Arc<Inner>,
    tx: watch::Sender<Option<SettledRefresh>>,
    episode: u64,
    outcome: Option<RefreshOutcome>,
}

impl Drop for Settlement {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or(RefreshOutcome::Failure(RefreshFailure::Aborted));
        let mut slot = self.inner.in_flight.lock();
        *slot = None;
        self.tx.send_replace(Some(SettledRefresh {
            episode: self.episode,
            outcome,
        }));
        debug!(episode = self.episode, "refresh episode settled");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;
    use crate::ports::TransportError;
    use portal_domain::ResponseEnvelope;
    use pretty_assertions::assert_eq;

    struct Always(Result<ResponseEnvelope, TransportError>);

    #[async_trait]
    impl HttpTransport for Always {
        async fn send(&self, _: &RequestEnvelope) -> Result<ResponseEnvelope, TransportError> {
            self.0.clone()
        }
    }

    fn coordinator(
        store: &MemoryCredentialStore,
        reply: Result<ResponseEnvelope, TransportError>,
    ) -> RefreshCoordinator {
        RefreshCoordinator::new(
            Arc::new(store.clone()),
            Arc::new(Always(reply)),
            Arc::new(SessionTracker::new(SessionState::Authenticated)),
            &ClientSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_success_writes_pair() {
        let store = MemoryCredentialStore::with_pair(CredentialPair::new("a1", "r1"));
        let coordinator = coordinator(
            &store,
            Ok(ResponseEnvelope::from_status(200, r#"{"accessToken":"a2"}"#)),
        );

        let settled = coordinator.refresh().await;

        assert_eq!(settled.episode, 1);
        assert_eq!(
            settled.outcome,
            RefreshOutcome::Success(CredentialPair::new("a2", "r1"))
        );
        assert_eq!(store.read().await, Some(CredentialPair::new("a2", "r1")));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_malformed_body_leaves_store_untouched() {
        let store = MemoryCredentialStore::with_pair(CredentialPair::new("a1", "r1"));
        let coordinator = coordinator(&store, Ok(ResponseEnvelope::from_status(200, "<html>")));

        let settled = coordinator.refresh().await;

        assert!(matches!(
            settled.outcome,
            RefreshOutcome::Failure(RefreshFailure::Malformed(_))
        ));
        assert_eq!(store.read().await, Some(CredentialPair::new("a1", "r1")));
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let store = MemoryCredentialStore::with_pair(CredentialPair::new("a1", "r1"));
        let coordinator = coordinator(&store, Ok(ResponseEnvelope::from_status(403, "")));

        let settled = coordinator.refresh().await;

        assert_eq!(
            settled.outcome,
            RefreshOutcome::Failure(RefreshFailure::Status(403))
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_failure() {
        let store = MemoryCredentialStore::with_pair(CredentialPair::new("a1", "r1"));
        let coordinator = coordinator(
            &store,
            Err(TransportError::ConnectionFailed("reset".to_string())),
        );

        let settled = coordinator.refresh().await;

        assert_eq!(
            settled.outcome,
            RefreshOutcome::Failure(RefreshFailure::Transport(
                "connection failed: reset".to_string()
            ))
        );
    }

    /// Clears the store the moment the refresh call arrives.
    struct ClearingServer(MemoryCredentialStore);

    #[async_trait]
    impl HttpTransport for ClearingServer {
        async fn send(&self, _: &RequestEnvelope) -> Result<ResponseEnvelope, TransportError> {
            self.0.clear().await.unwrap();
            Ok(ResponseEnvelope::from_status(
                200,
                r#"{"accessToken":"a2","refreshToken":"r2"}"#,
            ))
        }
    }

    #[tokio::test]
    async fn test_cleared_store_is_not_repopulated() {
        let store = MemoryCredentialStore::with_pair(CredentialPair::new("a1", "r1"));
        let session = Arc::new(SessionTracker::new(SessionState::Authenticated));
        let coordinator = RefreshCoordinator::new(
            Arc::new(store.clone()),
            Arc::new(ClearingServer(store.clone())),
            session.clone(),
            &ClientSettings::default(),
        );

        let settled = coordinator.refresh().await;

        assert_eq!(
            settled.outcome,
            RefreshOutcome::Failure(RefreshFailure::Superseded)
        );
        assert_eq!(store.read().await, None);
        assert_ne!(session.current(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_empty_store_is_no_credential() {
        let store = MemoryCredentialStore::new();
        let coordinator = coordinator(&store, Ok(ResponseEnvelope::from_status(200, "")));

        assert_eq!(coordinator.refresh().await.outcome, RefreshOutcome::NoCredential);
        assert_eq!(coordinator.episodes_started(), 1);
    }
}
