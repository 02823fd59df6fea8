//! Cancellable polling loops
//!
//! One loop per snapshot source. Each loop fetches immediately, applies the
//! outcome to its own slot, sleeps for its period and repeats until its
//! [`StopToken`] is cancelled. Fetches of one loop never overlap.
//!
//! A spawned loop is the only writer of its slot. Out-of-cadence polls are
//! requested through its [`RefreshHandle`] and run by the loop itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::health::HealthRegistry;
use crate::observability::{StructuredLogger, SyncMetrics};
use crate::transport::TransportError;

/// Something a polling loop can fetch repeatedly
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    type Snapshot: Send + Sync + 'static;

    /// Short loop name used in logs and metric labels
    fn name(&self) -> &'static str;

    /// Health registry component this loop reports to
    fn component(&self) -> &'static str;

    async fn fetch(&self) -> Result<Self::Snapshot, TransportError>;
}

/// Stop signal shared between a loop and its owner.
///
/// Cancelling is idempotent and wakes every pending [`StopToken::cancelled`].
#[derive(Debug, Clone)]
pub struct StopToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

impl StopToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Returns true if this call performed the cancellation
    pub fn cancel(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled (immediately if it already is)
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

/// What happened to one fetch result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Snapshot replaced, error cleared
    Applied,
    /// Error recorded, last good snapshot kept
    Failed,
    /// Loop already stopped, result discarded untouched
    Suppressed,
}

/// Latest snapshot and error held by one loop
#[derive(Debug)]
pub struct PollSlot<T> {
    latest: Option<Arc<T>>,
    last_error: Option<TransportError>,
    last_success_at: Option<DateTime<Utc>>,
    applied: u64,
    failed: u64,
    consecutive_failures: u32,
}

impl<T> Default for PollSlot<T> {
    fn default() -> Self {
        Self {
            latest: None,
            last_error: None,
            last_success_at: None,
            applied: 0,
            failed: 0,
            consecutive_failures: 0,
        }
    }
}

/// Slot shared between a loop and the view builder
pub type SharedSlot<T> = Arc<RwLock<PollSlot<T>>>;

/// Counters of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollStats {
    pub applied: u64,
    pub failed: u64,
    pub consecutive_failures: u32,
}

impl<T> PollSlot<T> {
    pub fn shared() -> SharedSlot<T> {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn latest(&self) -> Option<&Arc<T>> {
        self.latest.as_ref()
    }

    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
    }

    pub fn ever_applied(&self) -> bool {
        self.applied > 0
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn stats(&self) -> PollStats {
        PollStats {
            applied: self.applied,
            failed: self.failed,
            consecutive_failures: self.consecutive_failures,
        }
    }

    /// Apply one fetch outcome unless `token` is already cancelled.
    ///
    /// Callers hold the slot's write lock, so a stop that lands before this
    /// check is always honoured.
    pub fn apply(
        &mut self,
        token: &StopToken,
        outcome: Result<T, TransportError>,
    ) -> ApplyOutcome {
        if token.is_cancelled() {
            return ApplyOutcome::Suppressed;
        }

        match outcome {
            Ok(snapshot) => {
                self.latest = Some(Arc::new(snapshot));
                self.last_error = None;
                self.last_success_at = Some(Utc::now());
                self.applied += 1;
                self.consecutive_failures = 0;
                ApplyOutcome::Applied
            }
            Err(error) => {
                self.last_error = Some(error);
                self.failed += 1;
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                ApplyOutcome::Failed
            }
        }
    }
}

/// Pending out-of-cadence poll, answered with its outcome
type RefreshRequest = oneshot::Sender<Option<ApplyOutcome>>;

const REFRESH_QUEUE: usize = 16;

/// Asks a spawned loop to poll now instead of waiting out its period
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<RefreshRequest>,
}

impl RefreshHandle {
    /// Queue a poll and wait for its outcome.
    ///
    /// A request that lands while the loop is fetching is served by the
    /// next fetch, never by a concurrent one. Returns `None` if the loop
    /// stops first.
    pub async fn request(&self) -> Option<ApplyOutcome> {
        let (reply, outcome) = oneshot::channel();
        if self.tx.send(reply).await.is_err() {
            return None;
        }
        outcome.await.ok().flatten()
    }
}

async fn next_request(rx: &mut Option<mpsc::Receiver<RefreshRequest>>) -> Option<RefreshRequest> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Repeating fetch of one source into one slot
pub struct PollLoop<S: SnapshotSource> {
    source: Arc<S>,
    period: Duration,
    slot: SharedSlot<S::Snapshot>,
    token: StopToken,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
    metrics: SyncMetrics,
    marks_ready: bool,
    refresh_rx: Option<mpsc::Receiver<RefreshRequest>>,
}

impl<S: SnapshotSource> PollLoop<S> {
    pub fn new(
        source: Arc<S>,
        period: Duration,
        slot: SharedSlot<S::Snapshot>,
        token: StopToken,
    ) -> Self {
        Self {
            source,
            period,
            slot,
            token,
            health: None,
            logger: None,
            metrics: SyncMetrics::new(),
            marks_ready: false,
            refresh_rx: None,
        }
    }

    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Flag the health registry ready once this loop applies a snapshot
    pub fn marks_ready(mut self) -> Self {
        self.marks_ready = true;
        self
    }

    pub fn token(&self) -> &StopToken {
        &self.token
    }

    /// Run until the token is cancelled
    pub async fn run(mut self) {
        info!(
            poll_loop = self.source.name(),
            period_ms = self.period.as_millis() as u64,
            "Starting polling loop"
        );

        let mut waiting: Vec<RefreshRequest> = Vec::new();
        loop {
            let outcome = self.poll_once().await;
            for reply in waiting.drain(..) {
                let _ = reply.send(outcome);
            }
            if outcome.is_none() {
                break;
            }

            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                Some(reply) = next_request(&mut self.refresh_rx) => {
                    debug!(poll_loop = self.source.name(), "Refresh requested");
                    waiting.push(reply);
                }
                _ = tokio::time::sleep(self.period) => {}
            }

            // Requests queued meanwhile share the next fetch
            if let Some(rx) = self.refresh_rx.as_mut() {
                while let Ok(reply) = rx.try_recv() {
                    waiting.push(reply);
                }
            }
        }

        info!(poll_loop = self.source.name(), "Polling loop stopped");
    }

    /// Fetch once and apply the outcome.
    ///
    /// Returns `None` when the token fired while the request was in flight;
    /// the request is dropped and nothing is applied.
    pub async fn poll_once(&self) -> Option<ApplyOutcome> {
        if self.token.is_cancelled() {
            return None;
        }

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = self.token.cancelled() => return None,
            outcome = self.source.fetch() => outcome,
        };
        self.metrics
            .observe_fetch_latency(self.source.name(), started.elapsed().as_secs_f64());

        Some(self.apply(outcome).await)
    }

    async fn apply(&self, outcome: Result<S::Snapshot, TransportError>) -> ApplyOutcome {
        let name = self.source.name();

        let (result, had_data, failures, error) = {
            let mut slot = self.slot.write().await;
            let had_data = slot.ever_applied();
            let failures_before = slot.consecutive_failures();
            let result = slot.apply(&self.token, outcome);
            let failures = match result {
                ApplyOutcome::Applied => failures_before,
                _ => slot.consecutive_failures(),
            };
            (result, had_data, failures, slot.last_error().cloned())
        };

        match result {
            ApplyOutcome::Applied => {
                self.metrics.inc_applied(name);
                self.metrics.set_last_success(name, Utc::now().timestamp());
                if failures > 0 {
                    if let Some(logger) = &self.logger {
                        logger.log_poll_recovered(name, failures);
                    }
                }
                if let Some(health) = &self.health {
                    health.set_healthy(self.source.component()).await;
                    if self.marks_ready {
                        health.set_ready(true).await;
                    }
                }
            }
            ApplyOutcome::Failed => {
                self.metrics.inc_failed(name);
                let error = error.unwrap_or_else(|| TransportError::Unknown("unrecorded".into()));
                match &self.logger {
                    Some(logger) => logger.log_poll_failure(name, &error, failures, had_data),
                    None => debug!(poll_loop = name, error = %error, "Poll failed"),
                }
                if let Some(health) = &self.health {
                    if had_data {
                        health
                            .set_degraded(self.source.component(), error.to_string())
                            .await;
                    } else {
                        health
                            .set_unhealthy(self.source.component(), error.to_string())
                            .await;
                    }
                }
            }
            ApplyOutcome::Suppressed => {
                self.metrics.inc_suppressed(name);
                debug!(poll_loop = name, "Discarding result that arrived after stop");
            }
        }

        result
    }

    /// Spawn the loop onto the current runtime
    pub fn spawn(mut self) -> PollerHandle {
        let (tx, rx) = mpsc::channel(REFRESH_QUEUE);
        self.refresh_rx = Some(rx);
        let token = self.token.clone();
        let task = tokio::spawn(self.run());
        PollerHandle {
            token,
            refresh: RefreshHandle { tx },
            task: Some(task),
        }
    }
}

/// Owner side of a spawned loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct PollerHandle {
    token: StopToken,
    refresh: RefreshHandle,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Signal the loop to stop. Safe to call any number of times.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &StopToken {
        &self.token
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    /// Stop the loop and wait for its task to finish
    pub async fn shutdown(&mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "Polling task ended abnormally");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
