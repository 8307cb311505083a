//! Magic-link issuance and one-time token exchange.
//!
//! A one-time token moves `ISSUED -> CONSUMED` when exchanged for a session,
//! or `ISSUED -> EXPIRED` when nobody presents it within its lifetime.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, info};
use url::Url;

use super::store::{TokenStore, generate_token};
use super::{AuthError, normalize_email};
use crate::clock::Clock;
use crate::models::auth::{TokenKind, TokenRecord, VerifiedSession};
use crate::models::language::Language;

/// One-time (magic-link) token lifetime: 15 minutes.
pub const ONE_TIME_TOKEN_EXPIRY_SECS: i64 = 15 * 60;

/// Session token lifetime: 24 hours.
pub const SESSION_TOKEN_EXPIRY_SECS: i64 = 24 * 60 * 60;

/// Issues magic-link tokens and exchanges them for sessions.
pub struct MagicLinkAuthenticator {
    store: Arc<TokenStore>,
    clock: Arc<dyn Clock>,
    one_time_ttl: Duration,
    session_ttl: Duration,
}

impl MagicLinkAuthenticator {
    pub fn new(store: Arc<TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            one_time_ttl: Duration::seconds(ONE_TIME_TOKEN_EXPIRY_SECS),
            session_ttl: Duration::seconds(SESSION_TOKEN_EXPIRY_SECS),
        }
    }

    /// Issue a one-time token bound to `email` (and optionally an order).
    ///
    /// Delivering the link is the caller's job; see [`LinkMailer`].
    pub fn request_link(&self, email: &str, order_id: Option<&str>) -> Result<String, AuthError> {
        let identity = normalize_email(email);
        if identity.is_empty() {
            return Err(AuthError::InvalidInput("email is required".into()));
        }

        self.store.sweep_expired();

        let token = generate_token();
        let expires_at = self.clock.now() + self.one_time_ttl;
        self.store.put(
            &token,
            TokenRecord {
                identity,
                order_id: order_id
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_owned),
                kind: TokenKind::OneTime,
                expires_at,
            },
        );

        debug!(%expires_at, "issued magic-link token");
        Ok(token)
    }

    /// Exchange a one-time token for a session token.
    ///
    /// The one-time record is removed and the session record inserted with no
    /// suspension point in between, so a link yields at most one session.
    pub fn verify(&self, one_time_token: &str) -> Result<VerifiedSession, AuthError> {
        let one_time_token = one_time_token.trim();
        if one_time_token.is_empty() {
            return Err(AuthError::InvalidInput("token is required".into()));
        }

        self.store.sweep_expired();

        let record = self
            .store
            .take(one_time_token, TokenKind::OneTime)
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        let session_token = generate_token();
        let expires_at = self.clock.now() + self.session_ttl;
        self.store.put(
            &session_token,
            TokenRecord {
                identity: record.identity.clone(),
                order_id: record.order_id.clone(),
                kind: TokenKind::Session,
                expires_at,
            },
        );

        info!(email = %record.identity, %expires_at, "portal session started");
        Ok(VerifiedSession {
            session_token,
            email: record.identity,
            order_id: record.order_id,
            expires_at,
        })
    }
}

/// The portal verification page for `language`: `{site_url}/{lang}/portal/verify`.
pub fn verify_page(site_url: &Url, language: Language) -> Result<Url, AuthError> {
    let base = site_url.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/{}/portal/verify", language.code()))
        .map_err(|e| AuthError::Internal(format!("magic link url: {e}")))
}

/// Attach `token` to a verification page URL.
pub fn link_with_token(mut page: Url, token: &str) -> Url {
    page.query_pairs_mut().append_pair("token", token);
    page
}

/// Delivers magic links to users.
#[async_trait]
pub trait LinkMailer: Send + Sync {
    async fn send_link(&self, email: &str, link: &Url, language: Language) -> Result<(), AuthError>;
}

/// Mailer that records the delivery intent in the log. Never logs the link itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl LinkMailer for LogMailer {
    async fn send_link(&self, email: &str, link: &Url, language: Language) -> Result<(), AuthError> {
        info!(
            email = %email,
            host = link.host_str().unwrap_or_default(),
            %language,
            "magic link ready for delivery"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::clock::ManualClock;

    fn authenticator() -> (Arc<ManualClock>, Arc<TokenStore>, MagicLinkAuthenticator) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(TokenStore::new(clock.clone()));
        let auth = MagicLinkAuthenticator::new(store.clone(), clock.clone());
        (clock, store, auth)
    }

    #[test]
    fn empty_email_is_rejected() {
        let (_, store, auth) = authenticator();
        assert!(matches!(
            auth.request_link("   ", None),
            Err(AuthError::InvalidInput(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn link_verifies_exactly_once() {
        let (_, _, auth) = authenticator();
        let token = auth.request_link("User@Example.com ", Some("ord_1")).unwrap();

        let session = auth.verify(&token).unwrap();
        assert_eq!(session.email, "user@example.com");
        assert_eq!(session.order_id.as_deref(), Some("ord_1"));
        assert_ne!(session.session_token, token);

        assert!(matches!(
            auth.verify(&token),
            Err(AuthError::InvalidOrExpiredToken)
        ));
    }

    #[test]
    fn session_replaces_one_time_record() {
        let (_, store, auth) = authenticator();
        let token = auth.request_link("a@example.com", None).unwrap();
        let session = auth.verify(&token).unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.get(&token).is_none());
        let record = store.get(&session.session_token).unwrap();
        assert_eq!(record.kind, TokenKind::Session);
    }

    #[test]
    fn one_time_token_expires_after_fifteen_minutes() {
        let (clock, _, auth) = authenticator();
        let token = auth.request_link("a@example.com", None).unwrap();
        clock.advance(Duration::minutes(15) + Duration::milliseconds(1));
        assert!(matches!(
            auth.verify(&token),
            Err(AuthError::InvalidOrExpiredToken)
        ));
    }

    #[test]
    fn one_time_token_valid_just_before_expiry() {
        let (clock, _, auth) = authenticator();
        let token = auth.request_link("a@example.com", None).unwrap();
        clock.advance(Duration::minutes(15) - Duration::milliseconds(1));
        assert!(auth.verify(&token).is_ok());
    }

    #[test]
    fn session_lasts_twenty_four_hours() {
        let (clock, _, auth) = authenticator();
        let issued_at = clock.now();
        let token = auth.request_link("a@example.com", None).unwrap();
        let session = auth.verify(&token).unwrap();
        assert_eq!(session.expires_at, issued_at + Duration::hours(24));
    }

    #[test]
    fn session_token_cannot_be_exchanged() {
        let (_, store, auth) = authenticator();
        let token = auth.request_link("a@example.com", None).unwrap();
        let session = auth.verify(&token).unwrap();

        assert!(matches!(
            auth.verify(&session.session_token),
            Err(AuthError::InvalidOrExpiredToken)
        ));
        assert!(store.get(&session.session_token).is_some());
    }

    #[test]
    fn unknown_and_blank_tokens() {
        let (_, _, auth) = authenticator();
        assert!(matches!(
            auth.verify("never-issued"),
            Err(AuthError::InvalidOrExpiredToken)
        ));
        assert!(matches!(auth.verify(""), Err(AuthError::InvalidInput(_))));
    }

    #[test]
    fn concurrent_verification_grants_one_session() {
        let (_, _, auth) = authenticator();
        let auth = Arc::new(auth);
        let token = auth.request_link("race@example.com", None).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let auth = auth.clone();
                let token = token.clone();
                std::thread::spawn(move || auth.verify(&token).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn link_is_language_scoped() {
        let site = Url::parse("https://example.com/").unwrap();
        let link = link_with_token(verify_page(&site, Language::Ar).unwrap(), "abc-_123");
        assert_eq!(
            link.as_str(),
            "https://example.com/ar/portal/verify?token=abc-_123"
        );

        let site = Url::parse("https://example.com/site").unwrap();
        let page = verify_page(&site, Language::En).unwrap();
        assert_eq!(page.as_str(), "https://example.com/site/en/portal/verify");
        let link = link_with_token(page, "t");
        assert_eq!(link.as_str(), "https://example.com/site/en/portal/verify?token=t");
    }

    #[tokio::test]
    async fn log_mailer_accepts_links() {
        let link = Url::parse("https://example.com/en/portal/verify?token=t").unwrap();
        assert!(
            LogMailer
                .send_link("a@example.com", &link, Language::En)
                .await
                .is_ok()
        );
    }
}
