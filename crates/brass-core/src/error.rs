//! Error types for host collaborators.

use thiserror::Error;

/// Errors a host can report when asked to perform a side effect.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// The host is not connected to its gateway.
    #[error("host is not connected")]
    NotConnected,

    /// Message delivery failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The target channel does not exist or is not writable.
    #[error("channel '{0}' is unavailable")]
    ChannelUnavailable(String),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
