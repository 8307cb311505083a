//! Site monitoring models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One probe result. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub uptime: bool,
    /// 0 means the latency check failed.
    pub response_time_ms: u64,
    pub performance_score: u8,
    pub security_score: u8,
    pub ssl_valid: bool,
}

impl MetricsSnapshot {
    /// Worst-case snapshot recorded when the target could not be probed at all.
    pub fn unreachable(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            uptime: false,
            response_time_ms: 0,
            performance_score: 0,
            security_score: 0,
            ssl_valid: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Error,
    Warning,
}

/// Alert derived from the latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub message: String,
}

impl Alert {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: AlertSeverity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: AlertSeverity::Warning,
            message: message.into(),
        }
    }
}

/// Dashboard view over the monitoring history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSummary {
    pub latest: Option<MetricsSnapshot>,
    pub uptime_percentage: f64,
    pub average_performance: f64,
    pub alerts: Vec<Alert>,
    pub history_length: usize,
}
