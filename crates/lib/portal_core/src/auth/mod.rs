//! Portal authentication.
//!
//! Magic-link issuance, one-time token exchange and session validation,
//! all backed by the in-memory [`store::TokenStore`].

pub mod magic_link;
pub mod session;
pub mod store;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    InvalidInput(String),

    /// Covers unknown, consumed and expired tokens alike.
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Link delivery failed: {0}")]
    Delivery(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Normalise an email address for use as a token identity.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
