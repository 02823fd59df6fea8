//! Telemetry sync orchestration
//!
//! [`TelemetrySync`] owns both polling loops and their slots and builds the
//! [`DashboardView`] consumed by the presentation layer.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::fetch::{FullSnapshotSource, SummarySnapshotSource, DEFAULT_WINDOW_HOURS};
use super::poller::{ApplyOutcome, PollLoop, PollSlot, PollerHandle, SharedSlot, StopToken};
use crate::health::{components, HealthRegistry};
use crate::models::{
    ChartPoint, ConnectionState, DashboardView, FullSnapshot, IncidentSummary, SummarySnapshot,
};
use crate::observability::{StructuredLogger, SyncMetrics};
use crate::transport::{ClientConfig, HttpTransport, Transport};
use crate::view::{build_series, merge, normalize_incidents, normalize_recommendations, SyntheticProfile};

/// Configuration of the sync core
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Backend address and request timeouts
    pub client: ClientConfig,
    /// Period of the full snapshot loop (default: 10 seconds)
    pub full_interval: Duration,
    /// Period of the summary loop (default: 3 seconds)
    pub summary_interval: Duration,
    /// Aggregation window requested with the full snapshot (default: 24)
    pub window_hours: u32,
    /// Shape of synthetic chart points
    pub synthetic: SyntheticProfile,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            full_interval: Duration::from_secs(10),
            summary_interval: Duration::from_secs(3),
            window_hours: DEFAULT_WINDOW_HOURS,
            synthetic: SyntheticProfile::default(),
        }
    }
}

/// Builder for [`SyncConfig`]
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.client.base_url = url.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.client.request_timeout = timeout;
        self
    }

    pub fn full_interval(mut self, interval: Duration) -> Self {
        self.config.full_interval = interval;
        self
    }

    pub fn summary_interval(mut self, interval: Duration) -> Self {
        self.config.summary_interval = interval;
        self
    }

    pub fn window_hours(mut self, hours: u32) -> Self {
        self.config.window_hours = hours;
        self
    }

    pub fn synthetic_profile(mut self, profile: SyntheticProfile) -> Self {
        self.config.synthetic = profile;
        self
    }

    pub fn build(self) -> Result<SyncConfig> {
        let config = self.config;

        if config.full_interval.is_zero() || config.summary_interval.is_zero() {
            bail!("Polling intervals must be greater than zero");
        }
        if config.client.request_timeout.is_zero() {
            bail!("Request timeout must be greater than zero");
        }
        if config.window_hours == 0 {
            bail!("Aggregation window must be at least one hour");
        }
        url::Url::parse(&config.client.base_url)
            .with_context(|| format!("Invalid API URL: {}", config.client.base_url))?;

        Ok(config)
    }
}

/// Result of one out-of-band refresh, per loop.
/// `None` means a concurrent stop ended the loop before the poll applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub full: Option<ApplyOutcome>,
    pub summary: Option<ApplyOutcome>,
}

struct RunningLoops {
    full: PollerHandle,
    summary: PollerHandle,
}

/// Live telemetry sync: two polling loops plus view derivation
pub struct TelemetrySync {
    transport: Arc<dyn Transport>,
    config: SyncConfig,
    full: SharedSlot<FullSnapshot>,
    summary: SharedSlot<SummarySnapshot>,
    chart: Mutex<Vec<ChartPoint>>,
    running: Mutex<Option<RunningLoops>>,
    health: HealthRegistry,
    metrics: SyncMetrics,
    logger: StructuredLogger,
}

impl TelemetrySync {
    pub fn new(transport: Arc<dyn Transport>, config: SyncConfig) -> Self {
        let logger = StructuredLogger::new(config.client.base_url.clone());
        Self {
            transport,
            config,
            full: PollSlot::shared(),
            summary: PollSlot::shared(),
            chart: Mutex::new(Vec::new()),
            running: Mutex::new(None),
            health: HealthRegistry::new(),
            metrics: SyncMetrics::new(),
            logger,
        }
    }

    /// Create a sync core talking HTTP to `config.client.base_url`
    pub fn connect(config: SyncConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.client.clone())
            .context("Failed to create backend transport")?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn health(&self) -> HealthRegistry {
        self.health.clone()
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// Spawn both polling loops. A second call while running does nothing.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return;
        }

        self.health.register(components::FULL_SNAPSHOT_LOOP).await;
        self.health.register(components::SUMMARY_LOOP).await;

        let full = self.full_loop(StopToken::new()).spawn();
        let summary = self.summary_loop(StopToken::new()).spawn();

        self.logger.log_sync_started(
            self.config.full_interval.as_secs_f64(),
            self.config.summary_interval.as_secs_f64(),
        );
        *running = Some(RunningLoops { full, summary });
    }

    /// Stop both loops and wait for them to exit. Idempotent.
    ///
    /// Once this returns no fetch result is applied to either slot, including
    /// those of refreshes still waiting on the loops.
    pub async fn stop(&self) {
        let loops = self.running.lock().await.take();
        if let Some(mut loops) = loops {
            loops.full.stop();
            loops.summary.stop();
            loops.full.shutdown().await;
            loops.summary.shutdown().await;
            self.logger.log_sync_stopped("stop requested");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Fetch both snapshots once, outside the loop cadence.
    ///
    /// While running, each loop is asked to poll early and the refresh waits
    /// for that poll; a fetch already in flight is never duplicated. When
    /// stopped, both sources are polled directly while start and stop wait.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        let running = self.running.lock().await;
        let handles = running
            .as_ref()
            .map(|loops| (loops.full.refresh_handle(), loops.summary.refresh_handle()));

        let (full, summary) = match handles {
            Some((full, summary)) => {
                drop(running);
                tokio::join!(full.request(), summary.request())
            }
            None => {
                let full_loop = self.full_loop(StopToken::new());
                let summary_loop = self.summary_loop(StopToken::new());
                let outcome = tokio::join!(full_loop.poll_once(), summary_loop.poll_once());
                drop(running);
                outcome
            }
        };

        RefreshOutcome { full, summary }
    }

    fn full_loop(&self, token: StopToken) -> PollLoop<FullSnapshotSource> {
        let source = FullSnapshotSource::new(self.transport.clone(), self.config.window_hours);
        PollLoop::new(
            Arc::new(source),
            self.config.full_interval,
            self.full.clone(),
            token,
        )
        .with_health(self.health.clone())
        .with_logger(self.logger.clone())
        .marks_ready()
    }

    fn summary_loop(&self, token: StopToken) -> PollLoop<SummarySnapshotSource> {
        let source = SummarySnapshotSource::new(self.transport.clone());
        PollLoop::new(
            Arc::new(source),
            self.config.summary_interval,
            self.summary.clone(),
            token,
        )
        .with_health(self.health.clone())
        .with_logger(self.logger.clone())
    }

    /// Latest full snapshot, if any
    pub async fn full_snapshot(&self) -> Option<Arc<FullSnapshot>> {
        self.full.read().await.latest().cloned()
    }

    /// Latest summary snapshot, if any
    pub async fn summary_snapshot(&self) -> Option<Arc<SummarySnapshot>> {
        self.summary.read().await.latest().cloned()
    }

    /// Build the output surface from the current slots.
    ///
    /// The chart series is carried forward from the previous build.
    pub async fn view(&self) -> DashboardView {
        let (full, full_error, has_data) = {
            let slot = self.full.read().await;
            (
                slot.latest().cloned(),
                slot.last_error().cloned(),
                slot.ever_applied(),
            )
        };
        let (summary, summary_error) = {
            let slot = self.summary.read().await;
            (slot.latest().cloned(), slot.last_error().cloned())
        };

        let full = full.as_deref();
        let summary = summary.as_deref();

        let incidents = full
            .map(|f| normalize_incidents(f.incidents.recent.iter().cloned()))
            .unwrap_or_default();
        let recommendations = full
            .map(|f| normalize_recommendations(f.recommendations.iter().cloned()))
            .unwrap_or_default();

        let now = Utc::now();
        let chart = {
            let mut prior = self.chart.lock().await;
            let series = build_series(
                &prior,
                &incidents,
                summary,
                now,
                &self.config.synthetic,
                &mut rand::thread_rng(),
            );
            *prior = series.clone();
            series
        };

        let last_error = full_error.or(summary_error);
        let loading = !has_data;
        self.metrics.set_loading(loading);

        DashboardView {
            merged: merge(full, summary),
            chart,
            incidents,
            recommendations,
            connection: connection_state(has_data, last_error.is_some()),
            last_error,
            loading,
            incident_stats: full.map(|f| IncidentSummary {
                total: f.incidents.total,
                successful: f.incidents.successful,
                success_rate: f.incidents.success_rate,
            }),
            backend_health: full.and_then(|f| f.health.clone()),
            generated_at: now,
        }
    }
}

/// Coarse state from whether a full snapshot ever landed and whether the
/// latest poll of either loop failed
pub fn connection_state(has_data: bool, failing: bool) -> ConnectionState {
    match (has_data, failing) {
        (false, false) => ConnectionState::Loading,
        (false, true) => ConnectionState::Unreachable,
        (true, true) => ConnectionState::Degraded,
        (true, false) => ConnectionState::Live,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_config_default() {
        let config = SyncConfig::default();
        assert_eq!(config.client.base_url, "http://localhost:8000");
        assert_eq!(config.full_interval, Duration::from_secs(10));
        assert_eq!(config.summary_interval, Duration::from_secs(3));
        assert_eq!(config.window_hours, 24);
        assert_eq!(config.client.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_pattern() {
        let config = SyncConfigBuilder::new()
            .api_url("http://backend:9000")
            .full_interval(Duration::from_secs(30))
            .summary_interval(Duration::from_secs(5))
            .window_hours(6)
            .request_timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        assert_eq!(config.client.base_url, "http://backend:9000");
        assert_eq!(config.full_interval, Duration::from_secs(30));
        assert_eq!(config.summary_interval, Duration::from_secs(5));
        assert_eq!(config.window_hours, 6);
        assert_eq!(config.client.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_builder_rejects_invalid_values() {
        assert!(SyncConfigBuilder::new()
            .summary_interval(Duration::ZERO)
            .build()
            .is_err());
        assert!(SyncConfigBuilder::new().window_hours(0).build().is_err());
        assert!(SyncConfigBuilder::new()
            .request_timeout(Duration::ZERO)
            .build()
            .is_err());
        assert!(SyncConfigBuilder::new().api_url("localhost").build().is_err());
    }

    #[test]
    fn test_connection_state_table() {
        assert_eq!(connection_state(false, false), ConnectionState::Loading);
        assert_eq!(connection_state(false, true), ConnectionState::Unreachable);
        assert_eq!(connection_state(true, true), ConnectionState::Degraded);
        assert_eq!(connection_state(true, false), ConnectionState::Live);
    }
}
