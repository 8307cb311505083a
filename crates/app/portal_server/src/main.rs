//! Customer portal API server binary.
//!
//! Serves the portal endpoints, sweeps expired tokens in the background and
//! probes the public site on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use portal_api::config::{ApiConfig, Environment};
use portal_core::clock::SystemClock;
use tracing::{info, warn};

/// How often expired tokens are swept outside the request path.
const TOKEN_SWEEP_INTERVAL_SECS: u64 = 60;

/// CLI arguments for the API server. Unset options fall back to `ApiConfig::from_env()`.
///
/// Both sources reject values they cannot parse, so a typo in `PORTAL_ENV`
/// stops startup instead of silently selecting production.
#[derive(Parser, Debug)]
#[command(name = "portal_server", about = "Customer portal API server")]
struct Args {
    /// Port to listen on (0 = ephemeral). Overrides the port in `BIND_ADDR`.
    #[arg(long)]
    port: Option<u16>,

    /// Public site origin used in magic links.
    #[arg(long, env = "SITE_URL")]
    site_url: Option<String>,

    /// Deployment environment: development or production.
    #[arg(long, env = "PORTAL_ENV")]
    environment: Option<Environment>,

    /// Endpoint probed by the monitoring service.
    #[arg(long, env = "MONITOR_TARGET_URL")]
    monitor_target: Option<String>,

    /// Seconds between monitoring probes.
    #[arg(long, env = "MONITOR_INTERVAL_SECS")]
    monitor_interval: Option<u64>,

    /// Do not start the monitoring loop.
    #[arg(long, default_value_t = false)]
    no_monitoring: bool,
}

impl Args {
    fn apply(self, mut config: ApiConfig) -> ApiConfig {
        if let Some(port) = self.port {
            let host = config
                .bind_addr
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "127.0.0.1".into());
            config.bind_addr = format!("{host}:{port}");
        }
        if let Some(site_url) = self.site_url {
            config.site_url = site_url;
        }
        if let Some(environment) = self.environment {
            config.environment = environment;
        }
        if let Some(target) = self.monitor_target {
            config.monitor_target_url = target;
        }
        if let Some(secs) = self.monitor_interval.filter(|s| *s > 0) {
            config.monitor_interval_secs = secs;
        }
        config
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,portal_api=debug,portal_core=debug"))?,
        )
        .init();

    let args = Args::parse();
    let monitoring_enabled = !args.no_monitoring;
    let config = args.apply(ApiConfig::from_env()?);

    info!(
        bind_addr = %config.bind_addr,
        environment = %config.environment,
        site_url = %config.site_url,
        "starting portal_server"
    );
    if config.environment.is_development() {
        warn!("development mode: magic-link responses include the raw token");
    }
    if config.internal_api_token.is_none() && !config.environment.is_development() {
        warn!("INTERNAL_API_TOKEN is not set: monitoring and order intake routes are disabled");
    }

    let state = portal_api::AppState::init(config.clone(), Arc::new(SystemClock))?;

    let sweeper = state
        .tokens
        .spawn_sweeper(Duration::from_secs(TOKEN_SWEEP_INTERVAL_SECS));

    if monitoring_enabled {
        state.monitoring.start_monitoring();
    }
    let monitoring = state.monitoring.clone();

    let app = portal_api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    monitoring.stop_monitoring();
    sweeper.abort();

    result?;
    Ok(())
}
