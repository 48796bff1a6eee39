//! Error types for the chat API.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::{DatabaseError, ValidationError};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid session.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but acting on someone else's behalf.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// A dependency (model, upload signer) is not configured.
    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            ApiError::Database(DatabaseError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            ApiError::Database(DatabaseError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            ApiError::Database(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            match &self {
                ApiError::Database(DatabaseError::Validation(err)) => err.to_string(),
                ApiError::Database(DatabaseError::NotFound { entity, .. }) => {
                    format!("{} not found", entity)
                }
                other => other.to_string(),
            }
        };

        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!(message = %message, "Service unavailable");
        }

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ApiError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Database(DatabaseError::NotFound {
                    entity: "Chat",
                    id: "c1".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Database(DatabaseError::Validation(ValidationError::Empty(
                    "text".into(),
                ))),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
