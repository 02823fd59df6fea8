//! Observability infrastructure for the telemetry sync layer
//!
//! Provides:
//! - Prometheus metrics (poll outcomes, fetch latency, last success, loading state)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge,
    register_int_gauge_vec, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::transport::TransportError;

/// Histogram buckets for backend round trips (in seconds)
const FETCH_LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SyncMetricsInner> = OnceLock::new();

struct SyncMetricsInner {
    poll_outcomes: IntCounterVec,
    fetch_latency_seconds: HistogramVec,
    last_success_timestamp: IntGaugeVec,
    view_loading: IntGauge,
    chaos_triggers: IntCounterVec,
}

impl SyncMetricsInner {
    fn new() -> Self {
        Self {
            poll_outcomes: register_int_counter_vec!(
                "sentinel_poll_outcomes_total",
                "Poll results by loop and outcome (applied, failed, suppressed)",
                &["loop", "outcome"]
            )
            .expect("Failed to register poll_outcomes_total"),

            fetch_latency_seconds: register_histogram_vec!(
                "sentinel_fetch_latency_seconds",
                "Time spent fetching one snapshot from the backend",
                &["loop"],
                FETCH_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register fetch_latency_seconds"),

            last_success_timestamp: register_int_gauge_vec!(
                "sentinel_last_success_timestamp_seconds",
                "Unix time of the last applied snapshot per loop",
                &["loop"]
            )
            .expect("Failed to register last_success_timestamp_seconds"),

            view_loading: register_int_gauge!(
                "sentinel_view_loading",
                "1 until the first full snapshot has been applied"
            )
            .expect("Failed to register view_loading"),

            chaos_triggers: register_int_counter_vec!(
                "sentinel_chaos_triggers_total",
                "Chaos simulations requested by operation and result",
                &["operation", "result"]
            )
            .expect("Failed to register chaos_triggers_total"),
        }
    }
}

/// Sync metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share it.
#[derive(Clone)]
pub struct SyncMetrics {
    _private: (),
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SyncMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SyncMetricsInner {
        GLOBAL_METRICS.get_or_init(SyncMetricsInner::new)
    }

    pub fn inc_applied(&self, poll_loop: &str) {
        self.inc_outcome(poll_loop, "applied");
    }

    pub fn inc_failed(&self, poll_loop: &str) {
        self.inc_outcome(poll_loop, "failed");
    }

    pub fn inc_suppressed(&self, poll_loop: &str) {
        self.inc_outcome(poll_loop, "suppressed");
    }

    fn inc_outcome(&self, poll_loop: &str, outcome: &str) {
        self.inner()
            .poll_outcomes
            .with_label_values(&[poll_loop, outcome])
            .inc();
    }

    /// Current count for one loop/outcome pair
    pub fn outcome_count(&self, poll_loop: &str, outcome: &str) -> u64 {
        self.inner()
            .poll_outcomes
            .with_label_values(&[poll_loop, outcome])
            .get()
    }

    /// Record a fetch latency observation
    pub fn observe_fetch_latency(&self, poll_loop: &str, duration_secs: f64) {
        self.inner()
            .fetch_latency_seconds
            .with_label_values(&[poll_loop])
            .observe(duration_secs);
    }

    pub fn set_last_success(&self, poll_loop: &str, unix_secs: i64) {
        self.inner()
            .last_success_timestamp
            .with_label_values(&[poll_loop])
            .set(unix_secs);
    }

    pub fn set_loading(&self, loading: bool) {
        self.inner().view_loading.set(i64::from(loading));
    }

    pub fn inc_chaos_trigger(&self, operation: &str, success: bool) {
        let result = if success { "success" } else { "failure" };
        self.inner()
            .chaos_triggers
            .with_label_values(&[operation, result])
            .inc();
    }
}

/// Structured logger for sync lifecycle events
///
/// Tags every record with an `event` field and the backend it talks to.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    api_url: String,
}

impl StructuredLogger {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Log both polling loops starting
    pub fn log_sync_started(&self, full_interval_secs: f64, summary_interval_secs: f64) {
        info!(
            event = "sync_started",
            api_url = %self.api_url,
            full_interval_secs = full_interval_secs,
            summary_interval_secs = summary_interval_secs,
            "Telemetry sync started"
        );
    }

    /// Log polling loops stopping
    pub fn log_sync_stopped(&self, reason: &str) {
        info!(
            event = "sync_stopped",
            api_url = %self.api_url,
            reason = %reason,
            "Telemetry sync stopped"
        );
    }

    /// Log a failed poll. Failures with data on hand are a degraded view,
    /// failures before any data mean the backend is unreachable.
    pub fn log_poll_failure(
        &self,
        poll_loop: &str,
        error: &TransportError,
        consecutive_failures: u32,
        has_data: bool,
    ) {
        if has_data {
            warn!(
                event = "poll_failed",
                api_url = %self.api_url,
                poll_loop = %poll_loop,
                error = %error,
                consecutive_failures = consecutive_failures,
                "Poll failed, keeping last good snapshot"
            );
        } else {
            warn!(
                event = "poll_failed",
                api_url = %self.api_url,
                poll_loop = %poll_loop,
                error = %error,
                consecutive_failures = consecutive_failures,
                "Poll failed, backend unreachable"
            );
        }
    }

    /// Log the first success after one or more failures
    pub fn log_poll_recovered(&self, poll_loop: &str, failures: u32) {
        info!(
            event = "poll_recovered",
            api_url = %self.api_url,
            poll_loop = %poll_loop,
            failures = failures,
            "Backend reachable again"
        );
    }

    /// Log a chaos simulation request and the backend's answer
    pub fn log_chaos_triggered(&self, operation: &str, success: bool, message: Option<&str>) {
        if success {
            info!(
                event = "chaos_triggered",
                api_url = %self.api_url,
                operation = %operation,
                backend_message = message.unwrap_or_default(),
                "Chaos simulation accepted"
            );
        } else {
            warn!(
                event = "chaos_triggered",
                api_url = %self.api_url,
                operation = %operation,
                backend_message = message.unwrap_or_default(),
                "Chaos simulation rejected"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_metrics_record() {
        // Registry is process-global; handles share one set of metrics
        let metrics = SyncMetrics::new();
        let before = metrics.outcome_count("metrics_test_loop", "applied");

        metrics.inc_applied("metrics_test_loop");
        metrics.inc_applied("metrics_test_loop");
        metrics.inc_failed("metrics_test_loop");
        metrics.observe_fetch_latency("metrics_test_loop", 0.042);
        metrics.set_last_success("metrics_test_loop", 1_714_564_800);
        metrics.set_loading(false);
        metrics.inc_chaos_trigger("trigger_crash", true);

        let again = SyncMetrics::new();
        assert_eq!(again.outcome_count("metrics_test_loop", "applied"), before + 2);
        assert!(again.outcome_count("metrics_test_loop", "failed") >= 1);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("http://localhost:8000");
        assert_eq!(logger.api_url(), "http://localhost:8000");
    }
}
