//! Authentication domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a stored token grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Magic-link token, exchangeable once for a session.
    OneTime,
    /// Portal session token.
    Session,
}

/// A token's bound identity and lifetime, as held by the token store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Normalised email address the token is bound to.
    pub identity: String,
    pub order_id: Option<String>,
    pub kind: TokenKind,
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// A record is live strictly before `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of exchanging a magic-link token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
    pub session_token: String,
    pub email: String,
    pub order_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a session check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Valid {
        email: String,
        order_id: Option<String>,
    },
    Invalid,
}

impl SessionStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionStatus::Valid { .. })
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            SessionStatus::Valid { email, .. } => Some(email),
            SessionStatus::Invalid => None,
        }
    }
}
