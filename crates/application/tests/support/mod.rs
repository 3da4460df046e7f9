//! Scripted backend and host fakes shared by the integration tests.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use portal_application::{
    AuthenticatedClient, CredentialStore, HttpTransport, MemoryCredentialStore,
    RefreshCoordinator, SessionManager, SessionObserver, SessionTracker, TokenRefresher,
    TransportError,
};
use portal_domain::{
    ClientSettings, CredentialPair, RequestEnvelope, ResponseEnvelope, SessionState,
    SettledRefresh,
};

/// Path that answers 401 no matter which token is presented.
pub const ALWAYS_UNAUTHORIZED: &str = "/always-401";

/// How the fake refresh endpoint answers.
#[derive(Debug, Clone)]
pub enum RefreshBehavior {
    /// Issue `a{n}` (and `r{n}` when `rotate`) for the n-th refresh.
    Issue { rotate: bool },
    /// Answer with this status and an empty body.
    Reject(u16),
    /// Answer 200 with a body that is not a token response.
    Malformed,
    /// Never answer.
    Hang,
}

/// An in-process stand-in for the portal backend.
///
/// Protected paths answer 200 with the presented bearer token as the body
/// when the token is currently valid, and 401 otherwise.
pub struct FakeBackend {
    valid: Mutex<HashSet<String>>,
    behavior: Mutex<RefreshBehavior>,
    gate: watch::Sender<bool>,
    refresh_calls: AtomicUsize,
    requests: Mutex<Vec<RequestEnvelope>>,
}

impl FakeBackend {
    pub fn new(behavior: RefreshBehavior) -> Arc<Self> {
        let (gate, _) = watch::channel(true);
        Arc::new(Self {
            valid: Mutex::new(HashSet::new()),
            behavior: Mutex::new(behavior),
            gate,
            refresh_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Accepts `token` on protected paths.
    pub fn accept(&self, token: &str) {
        self.valid.lock().insert(token.to_string());
    }

    /// Expires every access token issued so far.
    pub fn expire_all(&self) {
        self.valid.lock().clear();
    }

    /// Holds refresh calls until [`FakeBackend::open_refresh_gate`].
    pub fn close_refresh_gate(&self) {
        self.gate.send_replace(false);
    }

    pub fn open_refresh_gate(&self) {
        self.gate.send_replace(true);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Requests to protected paths, in arrival order.
    pub fn requests(&self) -> Vec<RequestEnvelope> {
        self.requests.lock().clone()
    }

    async fn answer_refresh(&self, request: &RequestEnvelope) -> ResponseEnvelope {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 2;
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let body: serde_json::Value =
            serde_json::from_str(request.body().unwrap_or("{}")).unwrap_or_default();
        assert!(body["refreshToken"].is_string(), "refresh body: {body}");

        let behavior = self.behavior.lock().clone();
        match behavior {
            RefreshBehavior::Issue { rotate } => {
                let access = format!("a{n}");
                self.accept(&access);
                let payload = if rotate {
                    serde_json::json!({"accessToken": access, "refreshToken": format!("r{n}")})
                } else {
                    serde_json::json!({"accessToken": access})
                };
                ResponseEnvelope::from_status(200, payload.to_string())
            }
            RefreshBehavior::Reject(status) => ResponseEnvelope::from_status(status, ""),
            RefreshBehavior::Malformed => ResponseEnvelope::from_status(200, r#"{"token":1}"#),
            RefreshBehavior::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl HttpTransport for FakeBackend {
    async fn send(&self, request: &RequestEnvelope) -> Result<ResponseEnvelope, TransportError> {
        if request.path() == "/auth/refresh" {
            return Ok(self.answer_refresh(request).await);
        }

        self.requests.lock().push(request.clone());
        // Let other tasks interleave as a real network round trip would.
        tokio::task::yield_now().await;

        if let Some(status) = request.path().strip_prefix("/status/") {
            return Ok(ResponseEnvelope::from_status(
                status.parse::<u16>().unwrap(),
                "payload",
            ));
        }
        if request.path() == ALWAYS_UNAUTHORIZED {
            return Ok(ResponseEnvelope::from_status(401, ""));
        }

        match request.bearer() {
            Some(token) if self.valid.lock().contains(token) => {
                Ok(ResponseEnvelope::from_status(200, token.to_string()))
            }
            _ => Ok(ResponseEnvelope::from_status(401, r#"{"message":"jwt expired"}"#)),
        }
    }
}

/// Counts "go to login" signals.
#[derive(Default)]
pub struct CountingObserver {
    ended: Mutex<Vec<u64>>,
    at_login: AtomicBool,
}

impl CountingObserver {
    pub fn ended(&self) -> Vec<u64> {
        self.ended.lock().clone()
    }

    pub fn set_at_login(&self, at_login: bool) {
        self.at_login.store(at_login, Ordering::SeqCst);
    }
}

impl SessionObserver for CountingObserver {
    fn session_ended(&self, episode: u64) {
        self.ended.lock().push(episode);
    }

    fn is_at_login(&self) -> bool {
        self.at_login.load(Ordering::SeqCst)
    }
}

/// Wraps the coordinator to count callers that have entered `refresh`.
pub struct CountingRefresher {
    pub inner: RefreshCoordinator,
    entered: AtomicU64,
}

impl CountingRefresher {
    pub fn entered(&self) -> u64 {
        self.entered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh(&self) -> SettledRefresh {
        self.entered.fetch_add(1, Ordering::SeqCst);
        self.inner.refresh().await
    }
}

/// Everything a test needs, wired the way a host wires it.
pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub store: MemoryCredentialStore,
    pub observer: Arc<CountingObserver>,
    pub refresher: Arc<CountingRefresher>,
    pub session: Arc<SessionTracker>,
    pub client: Arc<AuthenticatedClient>,
}

impl Harness {
    pub fn new(behavior: RefreshBehavior, stored: Option<CredentialPair>) -> Self {
        Self::with_settings(behavior, stored, &ClientSettings::default())
    }

    pub fn with_settings(
        behavior: RefreshBehavior,
        stored: Option<CredentialPair>,
        settings: &ClientSettings,
    ) -> Self {
        let backend = FakeBackend::new(behavior);
        let store = stored.map_or_else(MemoryCredentialStore::new, MemoryCredentialStore::with_pair);
        let observer = Arc::new(CountingObserver::default());
        let session = Arc::new(SessionTracker::new(SessionState::Authenticated));
        let refresher = Arc::new(CountingRefresher {
            inner: RefreshCoordinator::new(
                Arc::new(store.clone()),
                backend.clone(),
                session.clone(),
                settings,
            ),
            entered: AtomicU64::new(0),
        });
        let client = Arc::new(AuthenticatedClient::new(
            backend.clone(),
            Arc::new(store.clone()),
            refresher.clone(),
            observer.clone(),
            session.clone(),
        ));
        Self {
            backend,
            store,
            observer,
            refresher,
            session,
            client,
        }
    }

    pub async fn stored(&self) -> Option<CredentialPair> {
        self.store.read().await
    }

    /// A session manager sharing this harness's store and session.
    pub fn sessions(&self) -> SessionManager {
        SessionManager::new(
            self.backend.clone(),
            Arc::new(self.store.clone()),
            self.session.clone(),
            &ClientSettings::default(),
        )
    }

    /// Yields until the refresh call has reached the backend.
    pub async fn until_refresh_sent(&self) {
        while self.backend.refresh_calls() == 0 {
            tokio::task::yield_now().await;
        }
    }

    /// Yields until `n` callers are waiting on a refresh.
    pub async fn until_refresh_entered(&self, n: u64) {
        while self.refresher.entered() < n {
            tokio::task::yield_now().await;
        }
    }
}

/// A pair whose access token the backend no longer accepts.
pub fn expired_pair() -> CredentialPair {
    CredentialPair::new("a1", "r1")
}
