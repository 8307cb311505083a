//! Application error types.

use axum::extract::rejection::JsonRejection;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Generic message for every token failure, so callers cannot tell unknown,
/// consumed and expired tokens apart.
pub const INVALID_OR_EXPIRED_TOKEN: &str = "Invalid or expired token";

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::Unavailable(m) => {
                (StatusCode::SERVICE_UNAVAILABLE, "upstream_unavailable", m.as_str())
            }
            AppError::Internal(detail) => {
                error!(detail = %detail, "internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            success: false,
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<portal_core::auth::AuthError> for AppError {
    fn from(e: portal_core::auth::AuthError) -> Self {
        match e {
            portal_core::auth::AuthError::InvalidInput(msg) => AppError::Validation(msg),
            portal_core::auth::AuthError::InvalidOrExpiredToken => {
                AppError::Unauthorized(INVALID_OR_EXPIRED_TOKEN.into())
            }
            portal_core::auth::AuthError::Delivery(msg) => AppError::Internal(msg),
            portal_core::auth::AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<portal_core::content::ContentError> for AppError {
    fn from(e: portal_core::content::ContentError) -> Self {
        match e {
            portal_core::content::ContentError::Upstream(msg) => AppError::Unavailable(msg),
            portal_core::content::ContentError::Decode(msg) => AppError::Internal(msg),
        }
    }
}

impl From<portal_core::portal::PortalError> for AppError {
    fn from(e: portal_core::portal::PortalError) -> Self {
        match e {
            portal_core::portal::PortalError::InvalidOrder(msg) => AppError::Validation(msg),
        }
    }
}
