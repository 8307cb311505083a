//! Health endpoint.

use axum::Json;

use crate::models::HealthResponse;

/// `GET /api/health`: liveness check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: portal_core::version().into(),
    })
}
