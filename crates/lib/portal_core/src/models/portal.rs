//! Customer portal order models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    InProgress,
    Delivered,
    Cancelled,
}

/// Order as produced by the payment webhook or the order intake form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub email: String,
    pub product: String,
    pub amount_cents: i64,
    pub currency: String,
    #[serde(default)]
    pub status: OrderStatus,
}

/// Stored order visible to its owner through the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: String,
    pub email: String,
    pub product: String,
    pub status: OrderStatus,
    pub amount_cents: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}
