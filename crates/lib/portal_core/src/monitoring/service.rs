//! Scheduled monitoring loop.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::aggregator::MetricsAggregator;
use super::collector::MetricsCollector;
use crate::models::monitoring::MetricsSnapshot;

/// Default probe interval: 5 minutes.
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 5 * 60;

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Probes a single target on a fixed interval and records into the aggregator.
///
/// At most one probe runs at a time. A scheduled tick or manual probe that
/// finds a probe in flight is skipped rather than queued.
pub struct MonitoringService {
    collector: Arc<MetricsCollector>,
    aggregator: Arc<MetricsAggregator>,
    target: String,
    interval: Duration,
    in_flight: tokio::sync::Mutex<()>,
    running: Mutex<Option<RunningLoop>>,
}

impl MonitoringService {
    pub fn new(
        collector: Arc<MetricsCollector>,
        aggregator: Arc<MetricsAggregator>,
        target: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            collector,
            aggregator,
            target: target.into(),
            interval,
            in_flight: tokio::sync::Mutex::new(()),
            running: Mutex::new(None),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn aggregator(&self) -> &Arc<MetricsAggregator> {
        &self.aggregator
    }

    /// Start the probe loop. The first probe runs immediately.
    ///
    /// Returns `false` if the loop was already running.
    pub fn start_monitoring(self: &Arc<Self>) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return false;
        }

        let cancel = CancellationToken::new();
        let service = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(service.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        service.scheduled_probe().await;
                    }
                }
            }
            debug!("monitoring loop exited");
        });

        info!(target_url = %self.target, interval_secs = self.interval.as_secs(), "monitoring started");
        *running = Some(RunningLoop { cancel, handle });
        true
    }

    /// Stop the probe loop. An in-flight probe finishes in the background and
    /// its snapshot is still recorded.
    pub fn stop_monitoring(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(RunningLoop { cancel, .. }) = running {
            cancel.cancel();
            info!(target_url = %self.target, "monitoring stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|r| !r.cancel.is_cancelled() && !r.handle.is_finished())
    }

    /// Probe now and record the result.
    ///
    /// Returns `None` without probing if another probe is in flight.
    pub async fn probe_now(&self) -> Option<MetricsSnapshot> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!(target_url = %self.target, "probe already running, manual probe refused");
            return None;
        };
        Some(self.probe_and_record().await)
    }

    async fn scheduled_probe(&self) -> Option<MetricsSnapshot> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!(target_url = %self.target, "previous probe still running, skipping tick");
            return None;
        };
        Some(self.probe_and_record().await)
    }

    async fn probe_and_record(&self) -> MetricsSnapshot {
        let snapshot = self.collector.probe(&self.target).await;
        if !snapshot.uptime {
            warn!(target_url = %self.target, "target is down");
        }
        self.aggregator.record(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::Router;
    use axum::routing::get;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::clock::SystemClock;
    use crate::monitoring::tls::CertificateCheck;

    struct NoCertificate;

    #[async_trait]
    impl CertificateCheck for NoCertificate {
        async fn certificate_valid(&self, _host: &str, _port: u16, _now: DateTime<Utc>) -> bool {
            false
        }
    }

    /// Local target that takes `delay` to answer and counts hits.
    async fn slow_target(delay: Duration, hits: Arc<AtomicUsize>) -> String {
        let app = Router::new().route(
            "/",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    "ok"
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn service(target: String, interval: Duration) -> Arc<MonitoringService> {
        let clock = Arc::new(SystemClock);
        let collector = MetricsCollector::new(clock.clone())
            .unwrap()
            .with_certificate_check(Arc::new(NoCertificate));
        Arc::new(MonitoringService::new(
            Arc::new(collector),
            Arc::new(MetricsAggregator::new(clock)),
            target,
            interval,
        ))
    }

    async fn wait_for_history(service: &MonitoringService, len: usize) {
        for _ in 0..100 {
            if service.aggregator().len() >= len {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("history never reached {len} entries");
    }

    #[tokio::test]
    async fn start_records_first_probe_and_stop_halts() {
        let hits = Arc::new(AtomicUsize::new(0));
        let target = slow_target(Duration::ZERO, hits.clone()).await;
        let service = service(target, Duration::from_secs(3600));

        assert!(service.start_monitoring());
        assert!(!service.start_monitoring());
        assert!(service.is_running());

        wait_for_history(&service, 1).await;
        let latest = service.aggregator().latest().unwrap();
        assert!(latest.uptime);
        assert!(!latest.ssl_valid);

        service.stop_monitoring();
        assert!(!service.is_running());
        service.stop_monitoring();
    }

    #[tokio::test]
    async fn restart_after_stop() {
        let hits = Arc::new(AtomicUsize::new(0));
        let target = slow_target(Duration::ZERO, hits).await;
        let service = service(target, Duration::from_secs(3600));

        assert!(service.start_monitoring());
        wait_for_history(&service, 1).await;
        service.stop_monitoring();

        assert!(service.start_monitoring());
        wait_for_history(&service, 2).await;
        service.stop_monitoring();
    }

    #[tokio::test]
    async fn slow_probes_do_not_overlap() {
        let hits = Arc::new(AtomicUsize::new(0));
        // Each probe issues three GETs that take 600ms; the interval is 100ms.
        let target = slow_target(Duration::from_millis(600), hits.clone()).await;
        let service = service(target, Duration::from_millis(100));

        service.start_monitoring();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        service.stop_monitoring();

        // Serialized probes: at most 3 started in 1.5s, 3 requests each.
        assert!(hits.load(Ordering::SeqCst) <= 9, "hits = {}", hits.load(Ordering::SeqCst));
        assert!(service.aggregator().len() <= 3);
    }

    #[tokio::test]
    async fn scheduled_tick_skips_while_manual_probe_runs() {
        let hits = Arc::new(AtomicUsize::new(0));
        let target = slow_target(Duration::from_millis(300), hits).await;
        let service = service(target, Duration::from_secs(3600));

        let manual = {
            let service = service.clone();
            tokio::spawn(async move { service.probe_now().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(service.scheduled_probe().await.is_none());

        let snapshot = manual.await.unwrap().unwrap();
        assert!(snapshot.uptime);
        assert_eq!(service.aggregator().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_manual_probes_do_not_queue() {
        let hits = Arc::new(AtomicUsize::new(0));
        let target = slow_target(Duration::from_millis(300), hits.clone()).await;
        let service = service(target, Duration::from_secs(3600));

        let probes: Vec<_> = (0..5)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.probe_now().await })
            })
            .collect();
        let mut completed = 0;
        for probe in probes {
            if probe.await.unwrap().is_some() {
                completed += 1;
            }
        }

        assert_eq!(completed, 1);
        assert_eq!(service.aggregator().len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        assert!(service.probe_now().await.is_some());
        assert_eq!(service.aggregator().len(), 2);
    }

    #[tokio::test]
    async fn unreachable_target_keeps_loop_alive() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let service = service(format!("http://{addr}/"), Duration::from_millis(50));

        service.start_monitoring();
        wait_for_history(&service, 2).await;
        assert!(service.is_running());
        assert!(!service.aggregator().latest().unwrap().uptime);
        service.stop_monitoring();
    }
}
