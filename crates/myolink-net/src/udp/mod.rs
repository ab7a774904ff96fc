//! UDP datagram event listener.
//!
//! This module provides the listener core:
//! - **UdpEventListener**: bound socket + cancellable receive loop
//! - **ListenerConfig**: bind address, datagram size limit, receive timeout
//! - **EventHandler**: the single-consumer dispatch seam
//!
//! # Example
//!
//! ```ignore
//! use myolink_net::udp::{ListenerConfig, UdpEventListener};
//!
//! let config = ListenerConfig::any_address(12345);
//! let listener = UdpEventListener::new(config)?;
//!
//! listener.set_handler(|event: &myolink_net::Event, source| {
//!     println!("{} from {source}", event.kind);
//! });
//!
//! listener.start().await?;
//! ```
//!
//! # Failure isolation
//!
//! The receive loop is the unit of fault isolation. Two named recovery
//! policies keep it alive:
//!
//! - **drop on decode failure**: datagrams that are not valid UTF-8 JSON of
//!   the expected shape are discarded and the loop continues. The channel is
//!   unauthenticated; adversarial or truncated input must never stop it.
//! - **isolate on handler fault**: a panicking handler is caught, logged and
//!   discarded. Consumer misbehavior must never stop delivery of later
//!   events.
//!
//! Only [`stop()`](UdpEventListener::stop) or a bind failure ends the loop.

mod config;
mod handler;
mod listener;
mod state;

pub use config::{DEFAULT_PORT, ListenerConfig};
pub use handler::EventHandler;
pub use listener::UdpEventListener;
pub use state::ListenerState;
