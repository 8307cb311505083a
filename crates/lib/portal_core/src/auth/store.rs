//! In-memory token store with lazy expiry.
//!
//! Records are keyed by the SHA-256 digest of the token, so the map never
//! holds a usable credential. Callers always address records by the raw token.
//!
//! Everything lives in process memory: a restart drops every pending link
//! and every portal session.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::clock::Clock;
use crate::models::auth::{TokenKind, TokenRecord};

/// Generate a random token: 32 bytes, base64url without padding.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash a token for use as a map key.
fn storage_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare a presented secret with the expected one by digest, so the
/// comparison time does not depend on how much of the secret matched.
pub fn tokens_match(presented: &str, expected: &str) -> bool {
    storage_key(presented) == storage_key(expected)
}

/// Keyed map from tokens to [`TokenRecord`]s.
///
/// A token is present only while it is unexpired and unconsumed: reads treat
/// expired records as absent and evict them on the way.
pub struct TokenStore {
    records: DashMap<String, TokenRecord>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    /// Insert or overwrite the record for `token`.
    pub fn put(&self, token: &str, record: TokenRecord) {
        self.records.insert(storage_key(token), record);
    }

    /// Look up a live record.
    pub fn get(&self, token: &str) -> Option<TokenRecord> {
        let key = storage_key(token);
        let now = self.clock.now();
        let record = self.records.get(&key).map(|entry| entry.value().clone())?;
        if record.is_expired(now) {
            self.records.remove_if(&key, |_, r| r.is_expired(now));
            return None;
        }
        Some(record)
    }

    /// Remove and return the record for `token` if it is live and of `kind`.
    ///
    /// Removal happens under the shard lock, so concurrent callers racing on
    /// the same token see it at most once.
    pub fn take(&self, token: &str, kind: TokenKind) -> Option<TokenRecord> {
        let (_, record) = self
            .records
            .remove_if(&storage_key(token), |_, r| r.kind == kind)?;
        if record.is_expired(self.clock.now()) {
            return None;
        }
        Some(record)
    }

    /// Remove `token`. Absent tokens are ignored.
    pub fn delete(&self, token: &str) {
        self.records.remove(&storage_key(token));
    }

    /// Evict every expired record. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.records.len();
        self.records.retain(|_, r| !r.is_expired(now));
        let removed = before.saturating_sub(self.records.len());
        if removed > 0 {
            debug!(removed, "swept expired tokens");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Spawn a periodic sweep task.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                store.sweep_expired();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::clock::ManualClock;

    fn record(kind: TokenKind, expires_in: Duration, clock: &ManualClock) -> TokenRecord {
        TokenRecord {
            identity: "user@example.com".into(),
            order_id: None,
            kind,
            expires_at: clock.now() + expires_in,
        }
    }

    fn store() -> (Arc<ManualClock>, TokenStore) {
        let clock = Arc::new(ManualClock::default());
        let store = TokenStore::new(clock.clone());
        (clock, store)
    }

    #[test]
    fn generated_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn keys_are_hashed() {
        let (clock, store) = store();
        store.put("secret-token", record(TokenKind::Session, Duration::hours(1), &clock));
        assert!(!store.records.contains_key("secret-token"));
        assert!(store.get("secret-token").is_some());
    }

    #[test]
    fn tokens_match_only_on_equal_secrets() {
        assert!(tokens_match("s3cret", "s3cret"));
        assert!(!tokens_match("s3cre", "s3cret"));
        assert!(!tokens_match("", "s3cret"));
    }

    #[test]
    fn put_overwrites() {
        let (clock, store) = store();
        store.put("t", record(TokenKind::OneTime, Duration::minutes(1), &clock));
        store.put("t", record(TokenKind::Session, Duration::minutes(1), &clock));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("t").map(|r| r.kind), Some(TokenKind::Session));
    }

    #[test]
    fn expired_record_is_absent_and_evicted() {
        let (clock, store) = store();
        store.put("t", record(TokenKind::Session, Duration::minutes(5), &clock));
        clock.advance(Duration::minutes(5));
        assert!(store.get("t").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn take_only_matches_requested_kind() {
        let (clock, store) = store();
        store.put("t", record(TokenKind::Session, Duration::minutes(5), &clock));
        assert!(store.take("t", TokenKind::OneTime).is_none());
        assert!(store.get("t").is_some());
        assert!(store.take("t", TokenKind::Session).is_some());
        assert!(store.take("t", TokenKind::Session).is_none());
    }

    #[test]
    fn take_removes_expired_record_without_returning_it() {
        let (clock, store) = store();
        store.put("t", record(TokenKind::OneTime, Duration::minutes(1), &clock));
        clock.advance(Duration::minutes(2));
        assert!(store.take("t", TokenKind::OneTime).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn delete_is_idempotent() {
        let (clock, store) = store();
        store.put("t", record(TokenKind::Session, Duration::minutes(1), &clock));
        store.delete("t");
        store.delete("t");
        store.delete("never-issued");
        assert!(store.is_empty());
    }

    #[test]
    fn sweep_removes_only_expired() {
        let (clock, store) = store();
        store.put("short", record(TokenKind::OneTime, Duration::minutes(15), &clock));
        store.put("long", record(TokenKind::Session, Duration::hours(24), &clock));
        clock.advance(Duration::minutes(16));
        assert_eq!(store.sweep_expired(), 1);
        assert!(store.get("short").is_none());
        assert!(store.get("long").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_task_evicts_in_background() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(TokenStore::new(clock.clone()));
        store.put("t", record(TokenKind::OneTime, Duration::minutes(1), &clock));
        clock.advance(Duration::minutes(2));

        let handle = store.spawn_sweeper(std::time::Duration::from_secs(60));
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        assert!(store.is_empty());
        handle.abort();
    }
}
