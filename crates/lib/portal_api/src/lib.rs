//! # portal_api
//!
//! HTTP API library for the customer portal.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::routing::{get, post};
use portal_core::auth::magic_link::{LinkMailer, LogMailer, MagicLinkAuthenticator};
use portal_core::auth::session::SessionValidator;
use portal_core::auth::store::TokenStore;
use portal_core::clock::Clock;
use portal_core::content::{ArticleSource, HttpArticleSource, InMemoryArticleSource};
use portal_core::monitoring::MonitoringError;
use portal_core::monitoring::aggregator::MetricsAggregator;
use portal_core::monitoring::collector::MetricsCollector;
use portal_core::monitoring::service::MonitoringService;
use portal_core::portal::PortalDataStore;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use url::Url;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::handlers::{articles, health, intake, monitoring, portal, portal_auth};

/// Errors raised while assembling [`AppState`].
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Monitoring setup failed: {0}")]
    Monitoring(#[from] MonitoringError),
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Parsed `config.site_url`.
    pub site_url: Url,
    pub tokens: Arc<TokenStore>,
    pub authenticator: Arc<MagicLinkAuthenticator>,
    pub sessions: Arc<SessionValidator>,
    pub mailer: Arc<dyn LinkMailer>,
    pub portal: Arc<PortalDataStore>,
    pub articles: Arc<dyn ArticleSource>,
    pub monitoring: Arc<MonitoringService>,
}

impl AppState {
    /// Build every store and service from `config`.
    ///
    /// Nothing is persisted: all state lives for the lifetime of the process.
    pub fn init(config: ApiConfig, clock: Arc<dyn Clock>) -> Result<Self, InitError> {
        let site_url = parse_site_url(&config.site_url)?;
        let tokens = Arc::new(TokenStore::new(clock.clone()));

        let articles: Arc<dyn ArticleSource> = match config.article_source_url.as_deref() {
            Some(base) => {
                let base = Url::parse(base)
                    .map_err(|e| InitError::Config(format!("ARTICLE_SOURCE_URL: {e}")))?;
                let source = HttpArticleSource::new(base)
                    .map_err(|e| InitError::Config(format!("ARTICLE_SOURCE_URL: {e}")))?;
                Arc::new(source)
            }
            None => Arc::new(InMemoryArticleSource::seeded()),
        };

        let collector = Arc::new(MetricsCollector::new(clock.clone())?);
        let aggregator = Arc::new(MetricsAggregator::new(clock.clone()));
        let monitoring = Arc::new(MonitoringService::new(
            collector,
            aggregator,
            config.monitor_target_url.clone(),
            Duration::from_secs(config.monitor_interval_secs),
        ));

        Ok(Self {
            site_url,
            authenticator: Arc::new(MagicLinkAuthenticator::new(tokens.clone(), clock.clone())),
            sessions: Arc::new(SessionValidator::new(tokens.clone())),
            tokens,
            mailer: Arc::new(LogMailer),
            portal: Arc::new(PortalDataStore::new(clock)),
            articles,
            monitoring,
            config,
        })
    }
}

/// `SITE_URL` must be an absolute http(s) URL that magic-link paths can be
/// appended to.
fn parse_site_url(raw: &str) -> Result<Url, InitError> {
    let url = Url::parse(raw.trim()).map_err(|e| InitError::Config(format!("SITE_URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(InitError::Config(format!(
            "SITE_URL: expected an http(s) URL, got '{raw}'"
        )));
    }
    Ok(url)
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".into())
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    // Public routes (no session required)
    let public = Router::new()
        .route(routes::GET_API_HEALTH, get(health::health))
        .route(
            routes::POST_PORTAL_REQUEST_LINK,
            post(portal_auth::request_link_handler),
        )
        .route(routes::POST_PORTAL_VERIFY, post(portal_auth::verify_handler))
        .route(
            routes::POST_PORTAL_SESSION,
            post(portal_auth::validate_session_handler),
        )
        .route(routes::POST_PORTAL_LOGOUT, post(portal_auth::logout_handler))
        .route(routes::GET_ARTICLES_SLUG, get(articles::get_article_handler));

    // Portal routes (require a session)
    let protected = Router::new()
        .route(routes::GET_PORTAL_ORDERS, get(portal::list_orders_handler))
        .route(routes::GET_PORTAL_ORDERS_ID, get(portal::get_order_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session::require_session,
        ));

    // Internal routes (monitoring dashboard, order intake)
    let internal = Router::new()
        .route(routes::GET_MONITORING, get(monitoring::summary_handler))
        .route(routes::POST_MONITORING_PROBE, post(monitoring::probe_handler))
        .route(routes::POST_INTERNAL_ORDERS, post(intake::record_order_handler))
        .route(
            routes::POST_INTERNAL_ORDERS_ID_STATUS,
            post(intake::update_status_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::internal::require_internal_token,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(internal)
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}
