//! Shared session state.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, MutexGuard, watch};

use portal_domain::SessionState;

/// Process-wide session state, observable by the host.
///
/// Also records which refresh episode last ended the session, so that the
/// many callers waiting on one failed episode end it only once.
///
/// Whoever writes or clears the stored credentials holds
/// [`SessionTracker::lock_credentials`] across the store change and the
/// matching state change.
#[derive(Debug)]
pub struct SessionTracker {
    state: watch::Sender<SessionState>,
    last_ended_episode: AtomicU64,
    credentials: Mutex<()>,
}

impl SessionTracker {
    /// Create a tracker in the given state.
    #[must_use]
    pub fn new(initial: SessionState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            last_ended_episode: AtomicU64::new(0),
            credentials: Mutex::new(()),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Moves to `next`, notifying subscribers only if the state changed.
    pub fn set(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                tracing::debug!(from = ?*current, to = ?next, "session state changed");
                *current = next;
                true
            }
        });
    }

    /// Waits for exclusive use of the stored credentials.
    pub async fn lock_credentials(&self) -> MutexGuard<'_, ()> {
        self.credentials.lock().await
    }

    /// Claims the right to end the session for `episode`.
    ///
    /// Returns true for exactly one caller per episode. Episodes older than
    /// one already ended are never claimed.
    pub fn claim_end(&self, episode: u64) -> bool {
        self.last_ended_episode.fetch_max(episode, Ordering::AcqRel) < episode
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new(SessionState::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_end_once_per_episode() {
        let tracker = SessionTracker::default();
        assert!(tracker.claim_end(1));
        assert!(!tracker.claim_end(1));
        assert!(tracker.claim_end(3));
        assert!(!tracker.claim_end(2));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let tracker = SessionTracker::default();
        let mut rx = tracker.subscribe();

        tracker.set(SessionState::Authenticated);

        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(*rx.borrow_and_update(), SessionState::Authenticated);

        tracker.set(SessionState::Authenticated);
        assert!(!rx.has_changed().unwrap_or(true));
    }

    #[tokio::test]
    async fn test_credentials_lock_is_exclusive() {
        let tracker = SessionTracker::default();

        let held = tracker.lock_credentials().await;
        assert!(tracker.credentials.try_lock().is_err());

        drop(held);
        assert!(tracker.credentials.try_lock().is_ok());
    }
}
