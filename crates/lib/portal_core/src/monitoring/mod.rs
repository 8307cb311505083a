//! Site monitoring.
//!
//! [`collector::MetricsCollector`] probes a target and produces a scored
//! snapshot, [`aggregator::MetricsAggregator`] keeps a bounded history and
//! derives statistics, and [`service::MonitoringService`] runs the probe on
//! a fixed schedule.

pub mod aggregator;
pub mod collector;
pub mod scoring;
pub mod service;
pub mod tls;

use thiserror::Error;

/// Errors raised inside a probe. They are absorbed into worst-case metric
/// values and never escape [`collector::MetricsCollector::probe`].
#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Target unresolvable: {0}")]
    Unresolvable(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),
}
