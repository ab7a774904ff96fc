//! The consumer-facing dispatch seam.

use std::net::SocketAddr;

use crate::event::Event;

/// Receives decoded events from the listener's receive loop.
///
/// The handler is invoked synchronously on the loop's task, once per
/// successfully decoded datagram, in socket receive order. It should do
/// lightweight work only (typically storing a "latest command" value): a
/// slow handler delays delivery of subsequent events, though it cannot
/// corrupt the loop.
///
/// A panic inside the handler is caught by the loop and discarded, so a
/// faulty consumer cannot stop the listener.
///
/// Any `Fn(&Event, SocketAddr) + Send + Sync` closure is a handler:
///
/// ```ignore
/// listener.set_handler(|event: &Event, source| {
///     println!("{} from {source}", event.kind);
/// });
/// ```
pub trait EventHandler: Send + Sync {
    /// Handle one decoded event and the address it was sent from.
    fn on_event(&self, event: &Event, source: SocketAddr);
}

impl<F> EventHandler for F
where
    F: Fn(&Event, SocketAddr) + Send + Sync,
{
    fn on_event(&self, event: &Event, source: SocketAddr) {
        self(event, source)
    }
}
