//! Portal authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    LogoutResponse, RequestLinkRequest, RequestLinkResponse, SessionRequest,
    ValidateSessionResponse, VerifyTokenRequest, VerifyTokenResponse,
};
use crate::services::portal_auth;

/// `POST /api/portal/request-link`: issue a magic link for an email.
pub async fn request_link_handler(
    State(state): State<AppState>,
    body: Result<Json<RequestLinkRequest>, JsonRejection>,
) -> AppResult<Json<RequestLinkResponse>> {
    let Json(body) = body?;
    let resp = portal_auth::request_link(&state, body).await?;
    Ok(Json(resp))
}

/// `POST /api/portal/verify`: exchange a magic-link token for a session.
pub async fn verify_handler(
    State(state): State<AppState>,
    body: Result<Json<VerifyTokenRequest>, JsonRejection>,
) -> AppResult<Json<VerifyTokenResponse>> {
    let Json(body) = body?;
    let token = body
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("token is required".into()))?;

    let session = state.authenticator.verify(&token)?;
    Ok(Json(VerifyTokenResponse {
        success: true,
        session_token: session.session_token,
        email: session.email,
        order_id: session.order_id,
        expires_at: session.expires_at.to_rfc3339(),
    }))
}

/// `POST /api/portal/session`: check whether a session token is current.
pub async fn validate_session_handler(
    State(state): State<AppState>,
    body: Result<Json<SessionRequest>, JsonRejection>,
) -> AppResult<Json<ValidateSessionResponse>> {
    let Json(body) = body?;
    let token = body
        .session_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("sessionToken is required".into()))?;

    let status = state.sessions.validate(&token);
    Ok(Json(ValidateSessionResponse {
        valid: status.is_valid(),
        email: status.email().map(str::to_owned),
    }))
}

/// `POST /api/portal/logout`: end a session. Always succeeds.
pub async fn logout_handler(
    State(state): State<AppState>,
    body: Result<Json<SessionRequest>, JsonRejection>,
) -> Json<LogoutResponse> {
    if let Ok(Json(SessionRequest {
        session_token: Some(token),
    })) = body
    {
        state.sessions.invalidate(&token);
    }
    Json(LogoutResponse { success: true })
}
