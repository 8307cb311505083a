//! Probe a target endpoint and fold the sub-checks into one snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use url::{Host, Url};

use super::MonitoringError;
use super::scoring::{count_security_headers, probe_performance_score, security_score};
use super::tls::{CertificateCheck, RustlsCertificateCheck};
use crate::clock::Clock;
use crate::models::monitoring::MetricsSnapshot;

/// Upper bound for each sub-check.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const HTTPS_PORT: u16 = 443;

/// Host and port whose certificate stands for `url`.
///
/// IPv6 hosts come back without brackets. Plain `http` targets are checked on
/// the default HTTPS port.
fn tls_endpoint(url: &Url) -> Option<(String, u16)> {
    let host = match url.host()? {
        Host::Domain(domain) => domain.to_string(),
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => addr.to_string(),
    };
    let port = match url.scheme() {
        "https" => url.port_or_known_default().unwrap_or(HTTPS_PORT),
        _ => HTTPS_PORT,
    };
    Some((host, port))
}

/// Runs the reachability, latency, TLS and security-header checks.
pub struct MetricsCollector {
    client: reqwest::Client,
    certificates: Arc<dyn CertificateCheck>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl MetricsCollector {
    pub fn new(clock: Arc<dyn Clock>) -> Result<Self, MonitoringError> {
        Self::with_timeout(clock, PROBE_TIMEOUT)
    }

    pub fn with_timeout(clock: Arc<dyn Clock>, timeout: Duration) -> Result<Self, MonitoringError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitoringError::Client(e.to_string()))?;
        Ok(Self {
            client,
            certificates: Arc::new(RustlsCertificateCheck::new(timeout)?),
            clock,
            timeout,
        })
    }

    /// Replace the TLS certificate check.
    pub fn with_certificate_check(mut self, certificates: Arc<dyn CertificateCheck>) -> Self {
        self.certificates = certificates;
        self
    }

    /// Probe `target`. Never fails: sub-check errors become worst-case values,
    /// and a target that cannot be parsed or resolved yields
    /// [`MetricsSnapshot::unreachable`].
    pub async fn probe(&self, target: &str) -> MetricsSnapshot {
        let timestamp = self.clock.now();

        let url = match self.resolve_target(target).await {
            Ok(url) => url,
            Err(e) => {
                warn!(url = target, error = %e, "probe failed before any check could run");
                return MetricsSnapshot::unreachable(timestamp);
            }
        };
        let (uptime, response_time_ms, ssl_valid, security_score) = tokio::join!(
            self.check_reachability(&url),
            self.measure_latency(&url),
            self.check_certificate(&url, timestamp),
            self.check_security_headers(&url),
        );

        let snapshot = MetricsSnapshot {
            timestamp,
            uptime,
            response_time_ms,
            performance_score: probe_performance_score(response_time_ms, uptime),
            security_score,
            ssl_valid,
        };
        debug!(
            url = target,
            uptime,
            response_time_ms,
            performance = snapshot.performance_score,
            security = snapshot.security_score,
            ssl_valid,
            "probe complete"
        );
        snapshot
    }

    /// Parse the target and make sure its host resolves.
    async fn resolve_target(&self, target: &str) -> Result<Url, MonitoringError> {
        let url = Url::parse(target).map_err(|e| MonitoringError::InvalidTarget(format!("{target}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MonitoringError::InvalidTarget(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        match url.host() {
            Some(Host::Domain(domain)) => {
                let port = url.port_or_known_default().unwrap_or(80);
                let mut addrs = tokio::time::timeout(
                    self.timeout,
                    tokio::net::lookup_host((domain, port)),
                )
                .await
                .map_err(|_| MonitoringError::Timeout(self.timeout))?
                .map_err(|e| MonitoringError::Unresolvable(format!("{domain}: {e}")))?;
                if addrs.next().is_none() {
                    return Err(MonitoringError::Unresolvable(format!("{domain}: no addresses")));
                }
            }
            Some(Host::Ipv4(_) | Host::Ipv6(_)) => {}
            None => {
                return Err(MonitoringError::InvalidTarget(format!("{target}: missing host")));
            }
        }
        Ok(url)
    }

    async fn check_certificate(&self, url: &Url, now: DateTime<Utc>) -> bool {
        match tls_endpoint(url) {
            Some((host, port)) => self.certificates.certificate_valid(&host, port, now).await,
            None => false,
        }
    }

    async fn check_reachability(&self, url: &Url) -> bool {
        match self.client.get(url.clone()).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "reachability check failed");
                false
            }
        }
    }

    /// Wall-clock time of one full GET in milliseconds; 0 on failure.
    async fn measure_latency(&self, url: &Url) -> u64 {
        let started = Instant::now();
        let result = async {
            let resp = self.client.get(url.clone()).send().await?;
            resp.bytes().await
        }
        .await;
        match result {
            Ok(_) => started.elapsed().as_millis() as u64,
            Err(e) => {
                debug!(error = %e, "latency check failed");
                0
            }
        }
    }

    async fn check_security_headers(&self, url: &Url) -> u8 {
        match self.client.get(url.clone()).send().await {
            Ok(resp) => {
                let https = resp.url().scheme() == "https";
                security_score(count_security_headers(resp.headers()), https)
            }
            Err(e) => {
                debug!(error = %e, "security header check failed");
                0
            }
        }
    }
}
