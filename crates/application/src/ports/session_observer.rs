//! Session observer port

/// Receives the "session ended, go log in" signal.
///
/// The host wires this to its own navigation. It is called at most once per
/// failed refresh episode.
pub trait SessionObserver: Send + Sync {
    /// The session could not be renewed; the user must log in again.
    fn session_ended(&self, episode: u64);

    /// Returns true if the host is already showing the login entry point,
    /// in which case `session_ended` is not signalled.
    fn is_at_login(&self) -> bool {
        false
    }
}
