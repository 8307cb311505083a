//! # portal_core
//!
//! Core domain logic for the customer portal: magic-link authentication,
//! session tokens, portal order data, article lookup and site monitoring.

pub mod auth;
pub mod clock;
pub mod content;
pub mod models;
pub mod monitoring;
pub mod portal;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
