//! Centralized API error handling
//!
//! Every failure reaching the HTTP boundary becomes an [`ApiError`]. The
//! client sees a category and a generic message; which step failed (unknown
//! account, wrong password, bad token) stays in the server logs.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication failed")]
    AuthenticationError,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request could not be completed")]
    PersistenceError(String),

    #[error("Request could not be completed")]
    InternalError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::AuthenticationError => "AUTHENTICATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PersistenceError(_) => "PERSISTENCE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code
    ///
    /// The auth endpoints answer every failure with 400.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        match &self {
            ApiError::InternalError(detail) | ApiError::PersistenceError(detail) => {
                tracing::error!(error = %detail, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::AccountCreationFailed(constraint) => {
                tracing::debug!(%constraint, "Registration rejected by store");
                ApiError::ValidationError("account could not be registered".to_string())
            }
            // Unknown account, wrong password and bad tokens look the same to the caller
            AuthError::AccountNotFound | AuthError::InvalidCredentials | AuthError::Token(_) => {
                tracing::debug!(reason = %err, "Authentication rejected");
                ApiError::AuthenticationError
            }
            AuthError::Password(e) => ApiError::InternalError(e.to_string()),
            AuthError::Store(e) => ApiError::PersistenceError(e.to_string()),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtError;
    use crate::store::StoreError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::ValidationError("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::AuthenticationError.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InternalError("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let not_found = ApiError::from(AuthError::AccountNotFound);
        let bad_password = ApiError::from(AuthError::InvalidCredentials);
        let expired = ApiError::from(AuthError::Token(JwtError::TokenExpired));

        for err in [&not_found, &bad_password, &expired] {
            assert_eq!(err.error_code(), "AUTHENTICATION_ERROR");
            assert_eq!(err.to_string(), "Authentication failed");
        }
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = ApiError::from(AuthError::Store(StoreError::Database(
            "connection refused to 10.0.0.5".to_string(),
        )));
        assert_eq!(err.error_code(), "PERSISTENCE_ERROR");
        assert!(!err.to_string().contains("10.0.0.5"));
    }
}
