//! Error types for transport operations.

use thiserror::Error;

/// Errors reported by a [`Client`](crate::Client) implementation.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The connection to the chat platform could not be established.
    #[error("failed to open transport: {reason}")]
    OpenFailed {
        /// Reason for failure.
        reason: String,
    },

    /// `open` was called on a client that already handed out its stream.
    #[error("transport is already open")]
    AlreadyOpen,

    /// An outbound message could not be delivered.
    #[error("failed to send message to '{channel}': {reason}")]
    SendFailed {
        /// Target channel.
        channel: String,
        /// Reason for failure.
        reason: String,
    },

    /// The connection was closed.
    #[error("transport closed: {reason}")]
    Closed {
        /// Reason for closure.
        reason: String,
    },
}

impl TransportError {
    /// Creates an open failure.
    pub fn open_failed(reason: impl Into<String>) -> Self {
        Self::OpenFailed {
            reason: reason.into(),
        }
    }

    /// Creates a send failure for `channel`.
    pub fn send_failed(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SendFailed {
            channel: channel.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
