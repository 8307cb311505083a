//! Portal session validation and logout.

use std::sync::Arc;

use tracing::debug;

use super::store::TokenStore;
use crate::models::auth::{SessionStatus, TokenKind};

/// Checks session tokens against the token store.
///
/// Expiry is fixed at issue time; validation never extends it.
pub struct SessionValidator {
    store: Arc<TokenStore>,
}

impl SessionValidator {
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }

    /// Returns the bound identity for a live session token. Never fails.
    pub fn validate(&self, session_token: &str) -> SessionStatus {
        self.store.sweep_expired();
        match self.store.get(session_token.trim()) {
            Some(record) if record.kind == TokenKind::Session => SessionStatus::Valid {
                email: record.identity,
                order_id: record.order_id,
            },
            _ => SessionStatus::Invalid,
        }
    }

    /// Delete the token. Unknown tokens are ignored.
    pub fn invalidate(&self, session_token: &str) {
        self.store.sweep_expired();
        self.store.delete(session_token.trim());
        debug!("session invalidated");
    }
}
