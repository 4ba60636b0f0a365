//! Error types for the relay server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crossclip_protocol::ErrorResponse;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the relay server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Missing or wrong shared secret.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Upload attempted while the relay is disarmed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Empty history or missing blob.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Invalid server configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::Unauthorized(_)
                | ServerError::Forbidden(_)
                | ServerError::NotFound(_)
                | ServerError::BadRequest(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            ServerError::Config(_) | ServerError::Internal(_) | ServerError::Io(_)
        )
    }

    /// Returns the text sent in the `detail` field of the error body.
    pub fn detail(&self) -> String {
        match self {
            ServerError::Unauthorized(msg)
            | ServerError::Forbidden(msg)
            | ServerError::NotFound(msg)
            | ServerError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Returns the HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Config(_) | ServerError::Internal(_) | ServerError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            detail: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::Forbidden("disarmed".into()).is_client_error());
        assert!(ServerError::Internal("oops".into()).is_server_error());
        assert!(!ServerError::BadRequest("bad".into()).is_server_error());
    }

    #[test]
    fn client_detail_is_bare_message() {
        let err = ServerError::Forbidden("System is DISARMED. Please ARM to sync.".into());
        assert_eq!(err.detail(), "System is DISARMED. Please ARM to sync.");
        assert_eq!(
            ServerError::Internal("boom".into()).detail(),
            "internal error: boom"
        );
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServerError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServerError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(
            ServerError::from(io).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
