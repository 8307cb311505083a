//! Gate for internal routes: monitoring and order intake.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use portal_core::auth::store::tokens_match;

use crate::AppState;
use crate::error::AppError;

/// Axum middleware: requires `Authorization: Bearer <INTERNAL_API_TOKEN>`.
///
/// Without a configured token the routes are open in development and closed
/// in production.
pub async fn require_internal_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.internal_api_token.as_deref() else {
        if state.config.environment.is_development() {
            return Ok(next.run(request).await);
        }
        return Err(AppError::Unauthorized("Internal API is not enabled".into()));
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing internal API token".into()))?;

    if !tokens_match(token, expected) {
        return Err(AppError::Unauthorized("Invalid internal API token".into()));
    }

    Ok(next.run(request).await)
}
