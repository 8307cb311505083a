//! Order intake handlers, called by the payment webhook relay and the
//! order form backend. Internal token required.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use portal_core::models::portal::{NewOrder, OrderRecord};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::UpdateOrderStatusRequest;

/// `POST /api/internal/orders`: record an "order created" event.
pub async fn record_order_handler(
    State(state): State<AppState>,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> AppResult<(StatusCode, Json<OrderRecord>)> {
    let Json(order) = body?;
    let record = state.portal.record_order(order)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `POST /api/internal/orders/{id}/status`: move an order to a new status.
pub async fn update_status_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    body: Result<Json<UpdateOrderStatusRequest>, JsonRejection>,
) -> AppResult<Json<OrderRecord>> {
    let Json(body) = body?;
    state
        .portal
        .update_status(&order_id, body.status)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))
}
