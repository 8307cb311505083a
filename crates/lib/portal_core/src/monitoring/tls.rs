//! TLS certificate validity check.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use super::MonitoringError;

/// Decides whether a host presents a currently valid certificate.
///
/// `host` is a bare domain name or IP address, never a bracketed IPv6 literal.
#[async_trait]
pub trait CertificateCheck: Send + Sync {
    /// `true` iff a peer certificate was returned and its "not after" date is
    /// later than `now`. Connection failures yield `false`.
    async fn certificate_valid(&self, host: &str, port: u16, now: DateTime<Utc>) -> bool;
}

/// Opens a TLS handshake to `host:port` and inspects the leaf certificate.
///
/// The handshake verifies the chain against the configured roots (the Mozilla
/// set by default), so an untrusted chain also reports invalid.
#[derive(Clone)]
pub struct RustlsCertificateCheck {
    connector: TlsConnector,
    timeout: Duration,
}

impl RustlsCertificateCheck {
    pub fn new(timeout: Duration) -> Result<Self, MonitoringError> {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        Self::with_roots(roots, timeout)
    }

    /// Verify chains against `roots` instead of the bundled Mozilla set.
    pub fn with_roots(roots: RootCertStore, timeout: Duration) -> Result<Self, MonitoringError> {
        let config = rustls::ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .map_err(|e| MonitoringError::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
        })
    }

    /// Handshake and return the leaf certificate's expiry.
    pub async fn peer_certificate_expiry(
        &self,
        host: &str,
        port: u16,
    ) -> Result<DateTime<Utc>, MonitoringError> {
        let server_name = ServerName::try_from(host.to_owned())
            .map_err(|e| MonitoringError::InvalidTarget(format!("{host}: {e}")))?;

        let tcp = TcpStream::connect((host, port))
            .await
            .map_err(|e| MonitoringError::Tls(format!("connect {host}:{port}: {e}")))?;
        let tls = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| MonitoringError::Tls(format!("handshake with {host}: {e}")))?;

        let (_, session) = tls.get_ref();
        let leaf = session
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| MonitoringError::Tls(format!("{host} sent no certificate")))?;

        let (_, cert) = x509_parser::parse_x509_certificate(leaf.as_ref())
            .map_err(|e| MonitoringError::Tls(format!("certificate parse: {e}")))?;
        let not_after = cert.validity().not_after.timestamp();
        DateTime::from_timestamp(not_after, 0)
            .ok_or_else(|| MonitoringError::Tls(format!("certificate expiry out of range: {not_after}")))
    }
}

#[async_trait]
impl CertificateCheck for RustlsCertificateCheck {
    async fn certificate_valid(&self, host: &str, port: u16, now: DateTime<Utc>) -> bool {
        match tokio::time::timeout(self.timeout, self.peer_certificate_expiry(host, port)).await {
            Ok(Ok(not_after)) => not_after > now,
            Ok(Err(e)) => {
                debug!(host, error = %e, "certificate check failed");
                false
            }
            Err(_) => {
                debug!(host, "certificate check timed out");
                false
            }
        }
    }
}
