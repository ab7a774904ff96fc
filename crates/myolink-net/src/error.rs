//! Error types for the networking core.
//!
//! Only construction and startup failures are representable here. Conditions
//! the receive loop recovers from on its own (receive timeouts, undecodable
//! datagrams, handler panics) are policy, not errors, and never surface.

/// A specialized Result type for listener operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or starting a listener.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value was rejected.
    #[error("invalid listener configuration: {0}")]
    InvalidConfig(String),

    /// Binding the listen socket failed (port in use, unroutable address).
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket-level I/O failure during startup.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
