//! Customer portal data handlers. Require a valid session.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::session::PortalSession;
use crate::models::OrderListResponse;
use portal_core::models::portal::OrderRecord;

/// `GET /api/portal/orders`: orders belonging to the session's email.
pub async fn list_orders_handler(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
) -> Json<OrderListResponse> {
    Json(OrderListResponse {
        orders: state.portal.orders_for(&session.email),
    })
}

/// `GET /api/portal/orders/{id}`: one order, if owned by the session.
pub async fn get_order_handler(
    State(state): State<AppState>,
    Extension(session): Extension<PortalSession>,
    Path(order_id): Path<String>,
) -> AppResult<Json<OrderRecord>> {
    state
        .portal
        .order(&session.email, &order_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))
}
