//! Portal order data.
//!
//! Consumes "order created" events from the payment webhook and intake forms
//! and serves each customer their own orders.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::auth::normalize_email;
use crate::clock::Clock;
use crate::models::portal::{NewOrder, OrderRecord, OrderStatus};

/// Order intake errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortalError {
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

fn validate(order: &NewOrder) -> Result<(), PortalError> {
    let email = order.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(PortalError::InvalidOrder("email must be an address".into()));
    }
    if order.product.trim().is_empty() {
        return Err(PortalError::InvalidOrder("product is required".into()));
    }
    if order.amount_cents < 0 {
        return Err(PortalError::InvalidOrder("amountCents must not be negative".into()));
    }
    let currency = order.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PortalError::InvalidOrder(
            "currency must be a three-letter code".into(),
        ));
    }
    Ok(())
}

/// In-memory order book keyed by customer email.
pub struct PortalDataStore {
    orders: DashMap<String, Vec<OrderRecord>>,
    clock: Arc<dyn Clock>,
}

impl PortalDataStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            orders: DashMap::new(),
            clock,
        }
    }

    /// Record a newly created order and return the stored copy.
    pub fn record_order(&self, order: NewOrder) -> Result<OrderRecord, PortalError> {
        validate(&order)?;
        let email = normalize_email(&order.email);
        let record = OrderRecord {
            id: Uuid::now_v7().to_string(),
            email: email.clone(),
            product: order.product.trim().to_string(),
            status: order.status,
            amount_cents: order.amount_cents,
            currency: order.currency.trim().to_uppercase(),
            created_at: self.clock.now(),
        };
        info!(order_id = %record.id, email = %email, "order recorded");
        self.orders.entry(email).or_default().push(record.clone());
        Ok(record)
    }

    /// Orders belonging to `email`, newest first.
    pub fn orders_for(&self, email: &str) -> Vec<OrderRecord> {
        let mut orders = self
            .orders
            .get(&normalize_email(email))
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// A single order, only if it belongs to `email`.
    pub fn order(&self, email: &str, order_id: &str) -> Option<OrderRecord> {
        self.orders
            .get(&normalize_email(email))?
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
    }

    /// Update the status of an existing order. Returns the updated record.
    pub fn update_status(&self, order_id: &str, status: OrderStatus) -> Option<OrderRecord> {
        self.orders.iter_mut().find_map(|mut entry| {
            let order = entry.value_mut().iter_mut().find(|o| o.id == order_id)?;
            order.status = status;
            Some(order.clone())
        })
    }
}
