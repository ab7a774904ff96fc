//! Networking core for MyoLink.
//!
//! This crate provides the **datagram event listener**: a background UDP
//! receiver that decodes EMG joystick control messages and dispatches them
//! to a single registered handler.
//!
//! ```ignore
//! use myolink_net::{Event, ListenerConfig, UdpEventListener};
//!
//! let config = ListenerConfig::new("127.0.0.1", 12345);
//! let listener = UdpEventListener::new(config)?;
//!
//! listener.set_handler(|event: &Event, source| {
//!     println!("{} from {source}: {:?}", event.kind, event.values);
//! });
//!
//! listener.start().await?;
//! // ... consumer runs on its own cadence ...
//! listener.stop().await;
//! ```
//!
//! The listener is built to survive the three failure sources a local
//! unauthenticated channel exposes: malformed datagrams are dropped, a
//! panicking handler is isolated, and `stop()` deterministically joins the
//! receive loop. See [`udp`] for details.

mod error;
mod event;
pub mod udp;

pub use error::{Error, Result};
pub use event::Event;

// Re-export commonly used types at the crate root
pub use udp::{DEFAULT_PORT, EventHandler, ListenerConfig, ListenerState, UdpEventListener};
