//! Session middleware: Bearer session token extraction and validation.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use portal_core::models::auth::SessionStatus;

use crate::AppState;
use crate::error::{AppError, INVALID_OR_EXPIRED_TOKEN};

/// Identity of the portal session making the request.
#[derive(Debug, Clone)]
pub struct PortalSession {
    pub email: String,
    pub order_id: Option<String>,
}

/// Axum middleware: extracts `Authorization: Bearer <session token>`,
/// validates it, and injects `PortalSession` into request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;

    let SessionStatus::Valid { email, order_id } = state.sessions.validate(token) else {
        return Err(AppError::Unauthorized(INVALID_OR_EXPIRED_TOKEN.into()));
    };

    request
        .extensions_mut()
        .insert(PortalSession { email, order_id });

    Ok(next.run(request).await)
}
