//! Hub error types
//!
//! Every failure the hub can produce is a [`HubError`]. Each variant maps to an
//! [`ErrorCategory`] which decides who gets to see it: validation and protocol
//! errors go back to the caller or sender, delivery errors stay inside the
//! broadcast path, transport errors end a single connection.

use crate::sync::ConnectionId;

/// Result alias used across the library.
pub type HubResult<T> = Result<T, HubError>;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Request/response input rejected before it reaches the store or the hub
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A streaming client sent something the protocol does not allow
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// One subscriber could not be sent a frame
    #[error("delivery to connection {connection} failed: {reason}")]
    Delivery {
        connection: ConnectionId,
        reason: &'static str,
    },

    /// A session tried to join with an id the registry already holds
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),

    /// The peer closed the stream
    #[error("connection closed by peer")]
    Disconnected,

    /// The stream broke for a reason other than a normal close
    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Categorized error types for routing decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input on the request/response path (never broadcast)
    Validation,

    /// Bad input on a stream (reported to the sender only)
    Protocol,

    /// Single-subscriber send failure (pruned, never surfaced)
    Delivery,

    /// Connection-ending failure
    Transport,

    /// Encoding failure
    Serialization,
}

impl ErrorCategory {
    /// Whether the connection that hit this error can keep going
    pub fn keeps_connection_open(&self) -> bool {
        matches!(self, ErrorCategory::Validation | ErrorCategory::Protocol)
    }
}

impl HubError {
    pub fn invalid(message: impl Into<String>) -> Self {
        HubError::InvalidRequest(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        HubError::ProtocolViolation(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            HubError::InvalidRequest(_) => ErrorCategory::Validation,
            HubError::ProtocolViolation(_) => ErrorCategory::Protocol,
            HubError::Delivery { .. } => ErrorCategory::Delivery,
            HubError::AlreadyRegistered(_)
            | HubError::Disconnected
            | HubError::Transport(_) => ErrorCategory::Transport,
            HubError::Serialization(_) => ErrorCategory::Serialization,
        }
    }

    /// A normal close: cleanup runs but nothing is re-raised
    pub fn is_disconnect(&self) -> bool {
        matches!(self, HubError::Disconnected)
    }

    /// Text for the `error` event sent back to a streaming client
    pub fn client_message(&self) -> String {
        match self {
            HubError::InvalidRequest(message) | HubError::ProtocolViolation(message) => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
