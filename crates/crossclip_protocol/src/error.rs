//! Error types for protocol encoding.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding wire messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The payload was not valid JSON for the expected type.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A clip kind string was not recognised.
    #[error("unknown clip kind: {0:?}")]
    UnknownKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::UnknownKind("video".into());
        assert!(err.to_string().contains("video"));
    }
}
