//! Lifecycle state for the event listener.

/// State of a [`UdpEventListener`](super::UdpEventListener).
///
/// Only these two states are observable from outside: the transitions inside
/// `start()` and `stop()` are not exposed. Invariant: the socket exists if
/// and only if the state is `Running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ListenerState {
    /// No socket is bound and no receive loop is running.
    #[default]
    Stopped,
    /// The socket is bound and the receive loop is active.
    Running,
}

impl std::fmt::Display for ListenerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerState::Stopped => write!(f, "Stopped"),
            ListenerState::Running => write!(f, "Running"),
        }
    }
}
