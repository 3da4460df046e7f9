//! Session observer adapters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use portal_application::ports::SessionObserver;

/// Logs session ends and otherwise does nothing.
///
/// Suitable for headless hosts where there is no login screen to show.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSessionObserver;

impl SessionObserver for LoggingSessionObserver {
    fn session_ended(&self, episode: u64) {
        tracing::warn!(episode, "session ended, log in again to continue");
    }
}

/// Forwards session ends to a host callback, typically its router.
///
/// The host flips [`CallbackSessionObserver::set_at_login`] as it enters and
/// leaves its login screen, so a redirect is never issued from the login
/// screen itself.
pub struct CallbackSessionObserver {
    on_ended: Box<dyn Fn(u64) + Send + Sync>,
    at_login: Arc<AtomicBool>,
}

impl CallbackSessionObserver {
    /// Calls `on_ended` with the episode number whenever the session ends.
    pub fn new(on_ended: impl Fn(u64) + Send + Sync + 'static) -> Self {
        Self {
            on_ended: Box::new(on_ended),
            at_login: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Records whether the host is currently showing its login entry point.
    pub fn set_at_login(&self, at_login: bool) {
        self.at_login.store(at_login, Ordering::Release);
    }
}

impl SessionObserver for CallbackSessionObserver {
    fn session_ended(&self, episode: u64) {
        (self.on_ended)(episode);
    }

    fn is_at_login(&self) -> bool {
        self.at_login.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for CallbackSessionObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSessionObserver")
            .field("at_login", &self.is_at_login())
            .finish_non_exhaustive()
    }
}
