/// Unified error types for the credential relay
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum RelayError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Client input errors (missing or malformed parameters)
    #[error("{0}")]
    Validation(String),

    /// The remote verifier rejected a presentation
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote issuer/verifier returned a non-success status
    #[error("{service} returned {status}: {message}")]
    Remote {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Network failure talking to a remote service
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<validator::ValidationErrors> for RelayError {
    fn from(errors: validator::ValidationErrors) -> Self {
        RelayError::Validation(errors.to_string())
    }
}

impl RelayError {
    /// True for failures caused by the caller rather than by the relay or a remote service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelayError::Validation(_) | RelayError::VerificationFailed(_) | RelayError::NotFound(_)
        )
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            RelayError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            RelayError::VerificationFailed(_) => (
                StatusCode::BAD_REQUEST,
                "VerificationFailed",
                self.to_string(),
            ),
            RelayError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            RelayError::Remote { .. } | RelayError::Transport(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "GeneralError",
                self.to_string(),
            ),
            RelayError::Database(_)
            | RelayError::Internal(_)
            | RelayError::Io(_)
            | RelayError::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (RelayError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (RelayError::VerificationFailed("x".into()), StatusCode::BAD_REQUEST),
            (RelayError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                RelayError::Remote {
                    service: "verifier",
                    status: 401,
                    message: "bad token".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (RelayError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_client_error_classification() {
        assert!(RelayError::Validation("missing".into()).is_client_error());
        assert!(RelayError::VerificationFailed("nope".into()).is_client_error());
        assert!(!RelayError::Internal("boom".into()).is_client_error());
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = RelayError::Validation("Verifier query param is required.".into());
        assert_eq!(err.to_string(), "Verifier query param is required.");
    }
}
