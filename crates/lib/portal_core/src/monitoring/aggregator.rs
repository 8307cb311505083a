//! Rolling snapshot history and derived statistics.

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Duration;

use crate::clock::Clock;
use crate::models::monitoring::{Alert, MetricsSnapshot, MonitoringSummary};

/// Maximum number of snapshots retained. Oldest entries are evicted first.
pub const MAX_HISTORY: usize = 1000;

/// Default trailing window for statistics.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

const PERFORMANCE_WARNING_BELOW: u8 = 60;
const SECURITY_WARNING_BELOW: u8 = 50;

/// Bounded, chronologically ordered snapshot history.
pub struct MetricsAggregator {
    history: RwLock<VecDeque<MetricsSnapshot>>,
    clock: Arc<dyn Clock>,
}

impl MetricsAggregator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            history: RwLock::new(VecDeque::with_capacity(MAX_HISTORY)),
            clock,
        }
    }

    /// Append a snapshot, evicting the oldest once the cap is exceeded.
    pub fn record(&self, snapshot: MetricsSnapshot) {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        history.push_back(snapshot);
        while history.len() > MAX_HISTORY {
            history.pop_front();
        }
    }

    pub fn latest(&self) -> Option<MetricsSnapshot> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    /// Copy of the full history, oldest first.
    pub fn history(&self) -> Vec<MetricsSnapshot> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.history.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshots taken within the trailing `window`.
    fn window(&self, window: Duration) -> Vec<MetricsSnapshot> {
        let since = self.clock.now() - window;
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.timestamp >= since)
            .cloned()
            .collect()
    }

    /// Percentage (0-100) of snapshots in the window that were up.
    ///
    /// An empty window reports 100.
    pub fn uptime_percentage(&self, window: Duration) -> f64 {
        let snapshots = self.window(window);
        if snapshots.is_empty() {
            return 100.0;
        }
        let up = snapshots.iter().filter(|s| s.uptime).count();
        up as f64 * 100.0 / snapshots.len() as f64
    }

    /// Mean performance score over the window; 0 when empty.
    pub fn average_performance(&self, window: Duration) -> f64 {
        let snapshots = self.window(window);
        if snapshots.is_empty() {
            return 0.0;
        }
        let total: u64 = snapshots.iter().map(|s| u64::from(s.performance_score)).sum();
        total as f64 / snapshots.len() as f64
    }

    /// Alerts derived from the latest snapshot only.
    pub fn alerts(&self) -> Vec<Alert> {
        let Some(latest) = self.latest() else {
            return Vec::new();
        };

        let mut alerts = Vec::new();
        if !latest.uptime {
            alerts.push(Alert::error("Site down"));
        }
        if latest.performance_score < PERFORMANCE_WARNING_BELOW {
            alerts.push(Alert::warning(format!(
                "Slow response: performance score {}",
                latest.performance_score
            )));
        }
        if !latest.ssl_valid {
            alerts.push(Alert::error("SSL certificate issue"));
        }
        if latest.security_score < SECURITY_WARNING_BELOW {
            alerts.push(Alert::warning(format!(
                "Missing security headers: security score {}",
                latest.security_score
            )));
        }
        alerts
    }

    /// Dashboard summary over the default 24-hour window.
    pub fn summary(&self) -> MonitoringSummary {
        let window = Duration::hours(DEFAULT_WINDOW_HOURS);
        MonitoringSummary {
            latest: self.latest(),
            uptime_percentage: self.uptime_percentage(window),
            average_performance: self.average_performance(window),
            alerts: self.alerts(),
            history_length: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::clock::ManualClock;
    use crate::models::monitoring::AlertSeverity;

    fn snapshot(timestamp: DateTime<Utc>, uptime: bool, performance_score: u8) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp,
            uptime,
            response_time_ms: 120,
            performance_score,
            security_score: 90,
            ssl_valid: true,
        }
    }

    fn aggregator() -> (Arc<ManualClock>, MetricsAggregator) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (clock.clone(), MetricsAggregator::new(clock))
    }

    fn day() -> Duration {
        Duration::hours(DEFAULT_WINDOW_HOURS)
    }

    #[test]
    fn history_is_capped_fifo() {
        let (clock, agg) = aggregator();
        let start = clock.now();
        for i in 0..=MAX_HISTORY as i64 {
            agg.record(snapshot(start + Duration::seconds(i), true, 100));
        }

        let history = agg.history();
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history[0].timestamp, start + Duration::seconds(1));
        assert_eq!(
            agg.latest().unwrap().timestamp,
            start + Duration::seconds(MAX_HISTORY as i64)
        );
    }

    #[test]
    fn empty_window_defaults() {
        let (_, agg) = aggregator();
        assert_eq!(agg.uptime_percentage(day()), 100.0);
        assert_eq!(agg.average_performance(day()), 0.0);
        assert!(agg.latest().is_none());
        assert!(agg.alerts().is_empty());
    }

    #[test]
    fn uptime_percentage_over_window() {
        let (clock, agg) = aggregator();
        for i in 0..10 {
            agg.record(snapshot(clock.now(), i < 7, 80));
        }
        assert!((agg.uptime_percentage(day()) - 70.0).abs() < 1e-9);
        assert!((agg.average_performance(day()) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn snapshots_outside_window_are_ignored() {
        let (clock, agg) = aggregator();
        agg.record(snapshot(clock.now() - Duration::hours(30), false, 20));
        agg.record(snapshot(clock.now() - Duration::hours(1), true, 100));
        agg.record(snapshot(clock.now(), true, 60));

        assert_eq!(agg.uptime_percentage(day()), 100.0);
        assert_eq!(agg.average_performance(day()), 80.0);
        assert_eq!(agg.len(), 3);

        clock.advance(Duration::hours(48));
        assert_eq!(agg.uptime_percentage(day()), 100.0);
        assert_eq!(agg.average_performance(day()), 0.0);
    }

    #[test]
    fn alerts_follow_latest_snapshot() {
        let (clock, agg) = aggregator();
        agg.record(MetricsSnapshot {
            timestamp: clock.now(),
            uptime: true,
            response_time_ms: 2500,
            performance_score: 40,
            security_score: 30,
            ssl_valid: false,
        });

        let alerts = agg.alerts();
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(alerts[1], Alert::error("SSL certificate issue"));
        assert_eq!(alerts[2].severity, AlertSeverity::Warning);

        agg.record(snapshot(clock.now(), true, 100));
        assert!(agg.alerts().is_empty());
    }

    #[test]
    fn fallback_snapshot_raises_down_and_ssl_errors() {
        let (clock, agg) = aggregator();
        agg.record(MetricsSnapshot::unreachable(clock.now()));

        let alerts = agg.alerts();
        assert!(alerts.contains(&Alert::error("Site down")));
        assert!(alerts.contains(&Alert::error("SSL certificate issue")));
        assert_eq!(alerts.len(), 4);
    }

    #[test]
    fn summary_collects_statistics() {
        let (clock, agg) = aggregator();
        agg.record(snapshot(clock.now(), false, 100));
        agg.record(snapshot(clock.now(), true, 60));

        let summary = agg.summary();
        assert_eq!(summary.history_length, 2);
        assert_eq!(summary.uptime_percentage, 50.0);
        assert_eq!(summary.average_performance, 80.0);
        assert!(summary.alerts.is_empty());
        assert!(summary.latest.unwrap().uptime);
    }
}
