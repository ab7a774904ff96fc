//! Configuration types for the UDP event listener.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default port used by the EMG bridge.
pub const DEFAULT_PORT: u16 = 12345;

/// Configuration for a [`UdpEventListener`](super::UdpEventListener).
///
/// Immutable once the listener is constructed.
#[derive(Clone, Debug)]
pub struct ListenerConfig {
    /// The host or interface to bind to.
    pub bind_address: String,
    /// The port to bind to. Use 0 for an OS-assigned port.
    pub port: u16,
    /// Largest datagram the receive buffer accepts, in bytes. Longer
    /// datagrams are truncated by the receive call and then fail decode.
    pub max_datagram_size: usize,
    /// How long one receive call may block. This makes the receive loop
    /// interruptible; it does not drop late data.
    pub recv_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            max_datagram_size: 4096,
            recv_timeout: Duration::from_secs(1),
        }
    }
}

impl ListenerConfig {
    /// Create a configuration that binds to the specified address and port.
    pub fn new(bind_address: impl Into<String>, port: u16) -> Self {
        Self {
            bind_address: bind_address.into(),
            port,
            ..Default::default()
        }
    }

    /// Create a configuration that binds to any address on the specified port.
    pub fn any_address(port: u16) -> Self {
        Self::new("0.0.0.0", port)
    }

    /// Set the maximum datagram size.
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.max_datagram_size = size;
        self
    }

    /// Set the receive timeout.
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Get the bind address string (address:port).
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Check the constraints the listener relies on.
    pub fn validate(&self) -> Result<()> {
        if self.max_datagram_size == 0 {
            return Err(Error::InvalidConfig(
                "max_datagram_size must be greater than zero".into(),
            ));
        }
        if self.recv_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "recv_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
