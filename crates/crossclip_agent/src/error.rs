//! Error types for the sync agent.

use crossclip_protocol::ProtocolError;
use thiserror::Error;

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur in the sync agent.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The relay rejected the shared secret.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Upload attempted while the relay is disarmed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Empty history or missing blob.
    #[error("not found: {0}")]
    NotFound(String),

    /// The relay rejected the request as malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Any other non-success status from the relay.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Response or push event could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The clipboard could not be read or written.
    #[error("clipboard error: {0}")]
    Clipboard(String),

    /// Invalid agent configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Not connected.
    #[error("not connected to relay")]
    NotConnected,
}

impl AgentError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Maps a non-success relay response to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => Self::BadRequest(message),
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::Server { status, message },
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Transport { retryable, .. } => *retryable,
            AgentError::Server { status, .. } => *status >= 500,
            AgentError::NotConnected => true,
            _ => false,
        }
    }
}

impl From<ProtocolError> for AgentError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(AgentError::transport_retryable("connection refused").is_retryable());
        assert!(!AgentError::transport_fatal("invalid url").is_retryable());
        assert!(AgentError::NotConnected.is_retryable());
        assert!(AgentError::from_status(502, "bad gateway").is_retryable());
        assert!(!AgentError::Forbidden("disarmed".into()).is_retryable());
        assert!(!AgentError::Unauthorized("bad key".into()).is_retryable());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            AgentError::from_status(401, "x"),
            AgentError::Unauthorized(_)
        ));
        assert!(matches!(
            AgentError::from_status(403, "x"),
            AgentError::Forbidden(_)
        ));
        assert!(matches!(
            AgentError::from_status(404, "x"),
            AgentError::NotFound(_)
        ));
        assert!(matches!(
            AgentError::from_status(400, "x"),
            AgentError::BadRequest(_)
        ));
        assert!(matches!(
            AgentError::from_status(500, "x"),
            AgentError::Server { status: 500, .. }
        ));
    }

    #[test]
    fn error_display() {
        let err = AgentError::NotConnected;
        assert_eq!(err.to_string(), "not connected to relay");

        let err = AgentError::from_status(418, "teapot");
        assert!(err.to_string().contains("418"));
        assert!(err.to_string().contains("teapot"));
    }
}
