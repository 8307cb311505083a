//! Monitoring dashboard handlers. Internal token required.

use axum::Json;
use axum::extract::State;
use portal_core::models::monitoring::{MetricsSnapshot, MonitoringSummary};

use crate::AppState;
use crate::error::{AppError, AppResult};

/// `GET /api/monitoring`: latest snapshot, 24h statistics and alerts.
pub async fn summary_handler(State(state): State<AppState>) -> Json<MonitoringSummary> {
    Json(state.monitoring.aggregator().summary())
}

/// `POST /api/monitoring/probe`: probe the target now and record the result.
/// Answers 409 while another probe is running.
pub async fn probe_handler(State(state): State<AppState>) -> AppResult<Json<MetricsSnapshot>> {
    state
        .monitoring
        .probe_now()
        .await
        .map(Json)
        .ok_or_else(|| AppError::Conflict("A probe is already running".into()))
}
