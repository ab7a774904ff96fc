//! The datagram event listener and its receive loop.

use std::net::{SocketAddr, ToSocketAddrs};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::config::ListenerConfig;
use super::handler::EventHandler;
use super::state::ListenerState;
use crate::error::{Error, Result};
use crate::event::Event;

/// Extra time `stop()` grants the receive loop, on top of the configured
/// receive timeout, to observe the cleared running flag before aborting it.
const STOP_GRACE_MARGIN: Duration = Duration::from_millis(250);

/// Internal state for the listener.
struct ListenerInner {
    state: ListenerState,
    local_addr: Option<SocketAddr>,
    task: Option<JoinHandle<()>>,
}

/// Shared slot holding the registered handler. Last write wins.
type HandlerSlot = Arc<Mutex<Option<Arc<dyn EventHandler>>>>;

/// A background UDP receiver that decodes JSON events and dispatches them to
/// a single registered handler.
///
/// The listener owns a bound socket and a receive loop running on its own
/// tokio task. `start()` and `stop()` are idempotent; the handler can be
/// registered or replaced before or while running.
///
/// # Example
///
/// ```ignore
/// let config = ListenerConfig::new("127.0.0.1", 12345);
/// let listener = UdpEventListener::new(config)?;
///
/// listener.set_handler(|event: &Event, source| {
///     println!("{} from {source}: {:?}", event.kind, event.values);
/// });
///
/// listener.start().await?;
/// // ...
/// listener.stop().await;
/// ```
pub struct UdpEventListener {
    config: ListenerConfig,
    inner: Arc<Mutex<ListenerInner>>,
    handler: HandlerSlot,
    is_running: Arc<AtomicBool>,
}

impl UdpEventListener {
    /// Create a new listener with the given configuration. No I/O happens
    /// until [`start()`](Self::start).
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration violates its
    /// constraints.
    pub fn new(config: ListenerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(ListenerInner {
                state: ListenerState::Stopped,
                local_addr: None,
                task: None,
            })),
            handler: Arc::new(Mutex::new(None)),
            is_running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get the listener configuration.
    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> ListenerState {
        self.inner.lock().state
    }

    /// Check whether the receive loop is running.
    pub fn is_running(&self) -> bool {
        self.inner.lock().state == ListenerState::Running
    }

    /// Get the bound local address.
    /// Returns `None` unless the listener is running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().local_addr
    }

    /// Register or replace the handler.
    ///
    /// May be called before `start()` or at any time while running; the loop
    /// observes the replacement on the next dispatch. An event already being
    /// dispatched may still go to the previous handler.
    pub fn set_handler<H>(&self, handler: H)
    where
        H: EventHandler + 'static,
    {
        *self.handler.lock() = Some(Arc::new(handler));
    }

    /// Remove the registered handler. Subsequent events are dropped.
    pub fn clear_handler(&self) {
        *self.handler.lock() = None;
    }

    /// Bind the socket and start the receive loop.
    ///
    /// If the listener is already running, this is a no-op. The socket is
    /// bound with address reuse enabled so a quick restart on the same port
    /// does not fail. A bind failure is returned to the caller, is not
    /// retried, and leaves the listener `Stopped`.
    ///
    /// The caller is never blocked beyond the bind call itself: the receive
    /// loop runs on its own task.
    pub async fn start(&self) -> Result<()> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Ok(()); // Already running
        }

        let socket = match bind_reusable(&self.config) {
            Ok(socket) => socket,
            Err(e) => {
                self.is_running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let local_addr = match socket.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.is_running.store(false, Ordering::SeqCst);
                return Err(Error::Io(e));
            }
        };

        debug!(target: "myolink_net::udp", "listening on {local_addr}");

        let is_running = self.is_running.clone();
        let handler = self.handler.clone();
        let max_datagram_size = self.config.max_datagram_size;
        let recv_timeout = self.config.recv_timeout;

        let task = tokio::spawn(async move {
            recv_loop(socket, is_running, handler, max_datagram_size, recv_timeout).await;
        });

        let mut inner = self.inner.lock();
        inner.state = ListenerState::Running;
        inner.local_addr = Some(local_addr);
        inner.task = Some(task);
        Ok(())
    }

    /// Stop the receive loop and release the socket.
    ///
    /// Idempotent and safe to call from any task. Waits up to the configured
    /// receive timeout plus a fixed margin for the loop to observe the stop
    /// and exit; if it has not exited by then, the task is aborted. Either
    /// way the socket is dropped and the port is immediately reusable.
    pub async fn stop(&self) {
        if !self.is_running.swap(false, Ordering::SeqCst) {
            return; // Already stopped
        }

        // Take the handle out before awaiting; the lock must not be held
        // across an await point.
        let task = self.inner.lock().task.take();

        if let Some(mut task) = task {
            let grace = self.config.recv_timeout + STOP_GRACE_MARGIN;
            if tokio::time::timeout(grace, &mut task).await.is_err() {
                warn!(
                    target: "myolink_net::udp",
                    "receive loop did not exit within {grace:?}, aborting"
                );
                task.abort();
            }
        }

        let mut inner = self.inner.lock();
        inner.state = ListenerState::Stopped;
        inner.local_addr = None;
        debug!(target: "myolink_net::udp", "listener stopped");
    }
}

impl std::fmt::Debug for UdpEventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpEventListener")
            .field("bind_addr", &self.config.bind_addr())
            .field("state", &self.state())
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

/// Bind the listen socket with `SO_REUSEADDR`, non-blocking, and register it
/// with the tokio runtime.
fn bind_reusable(config: &ListenerConfig) -> Result<UdpSocket> {
    let bind_addr = config.bind_addr();
    let addr = bind_addr
        .to_socket_addrs()
        .map_err(|e| Error::InvalidConfig(format!("cannot resolve bind address {bind_addr}: {e}")))?
        .next()
        .ok_or_else(|| {
            Error::InvalidConfig(format!("bind address {bind_addr} resolved to nothing"))
        })?;

    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into()).map_err(|e| Error::Bind {
        addr: bind_addr,
        source: e,
    })?;

    UdpSocket::from_std(socket.into()).map_err(Error::Io)
}

/// The receive loop. Owns the socket for the lifetime of `Running`; dropping
/// the socket on exit is what releases the port.
async fn recv_loop(
    socket: UdpSocket,
    is_running: Arc<AtomicBool>,
    handler: HandlerSlot,
    max_datagram_size: usize,
    recv_timeout: Duration,
) {
    let mut buf = vec![0u8; max_datagram_size];

    while is_running.load(Ordering::SeqCst) {
        let received =
            match tokio::time::timeout(recv_timeout, socket.recv_from(&mut buf)).await {
                // Timed out: this is the cooperative cancellation check
                // point, not an error.
                Err(_) => continue,
                Ok(Err(e)) => {
                    if !is_running.load(Ordering::SeqCst) {
                        break; // Shutdown in progress
                    }
                    debug!(target: "myolink_net::udp", "transient receive error: {e}");
                    continue;
                }
                Ok(Ok(received)) => received,
            };

        let (len, source) = received;
        dispatch(&buf[..len], source, &handler);
    }

    debug!(target: "myolink_net::udp", "receive loop exited");
}

/// Decode one datagram and hand it to the registered handler.
///
/// Two recovery policies keep the loop alive: **drop on decode failure**
/// (the channel is unauthenticated, bad input is expected) and **isolate on
/// handler fault** (a panicking handler must not stop later deliveries).
fn dispatch(payload: &[u8], source: SocketAddr, handler: &Mutex<Option<Arc<dyn EventHandler>>>) {
    // from_slice covers both decode steps: UTF-8 validation and structure.
    let event: Event = match serde_json::from_slice(payload) {
        Ok(event) => event,
        Err(e) => {
            trace!(target: "myolink_net::udp", "dropping undecodable datagram from {source}: {e}");
            return;
        }
    };

    // Snapshot the handler so a concurrent set_handler() cannot block on the
    // slot while a dispatch is in flight.
    let handler = handler.lock().clone();
    let Some(handler) = handler else {
        trace!(target: "myolink_net::udp", "no handler registered, event from {source} dropped");
        return;
    };

    let dispatched = panic::catch_unwind(AssertUnwindSafe(|| handler.on_event(&event, source)));
    if dispatched.is_err() {
        warn!(target: "myolink_net::udp", "handler panicked on event from {source}, continuing");
    }
}
