//! Chaos-test triggers
//!
//! Fire-and-forget calls into the backend's simulation endpoints. Results
//! come back unchanged; the polling loops pick up their effects on the
//! cluster like any other change.

use std::sync::Arc;
use std::time::Duration;

use crate::models::{ChaosStatus, SimulationOutcome};
use crate::observability::{StructuredLogger, SyncMetrics};
use crate::sync::decode;
use crate::transport::{Operation, Transport, TransportError};

/// Deployment targeted when none is given
pub const DEFAULT_TARGET: &str = "nginx-demo";

/// Length of a cpu spike when none is given
pub const DEFAULT_SPIKE_DURATION: Duration = Duration::from_secs(300);

/// Client for the simulation endpoints
#[derive(Clone)]
pub struct ChaosClient {
    transport: Arc<dyn Transport>,
    logger: Option<StructuredLogger>,
    metrics: SyncMetrics,
}

impl ChaosClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            logger: None,
            metrics: SyncMetrics::new(),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Start a cpu stress run against `target` for `duration`
    pub async fn trigger_cpu_spike(
        &self,
        target: &str,
        duration: Duration,
    ) -> Result<SimulationOutcome, TransportError> {
        self.trigger(
            Operation::TriggerCpuSpike,
            vec![
                ("deployment", target.to_string()),
                ("duration", duration.as_secs().to_string()),
            ],
        )
        .await
    }

    /// Delete one pod of `target`
    pub async fn trigger_crash(&self, target: &str) -> Result<SimulationOutcome, TransportError> {
        self.trigger(Operation::TriggerCrash, vec![("deployment", target.to_string())])
            .await
    }

    /// Delete half of the pods of `target` at once
    pub async fn trigger_cascade(&self, target: &str) -> Result<SimulationOutcome, TransportError> {
        self.trigger(Operation::TriggerCascade, vec![("deployment", target.to_string())])
            .await
    }

    /// Remove leftover stress pods
    pub async fn cleanup(&self) -> Result<SimulationOutcome, TransportError> {
        self.trigger(Operation::CleanupSimulations, Vec::new()).await
    }

    pub async fn status(&self) -> Result<ChaosStatus, TransportError> {
        let body = self.transport.call(Operation::GetChaosStatus, &[]).await?;
        decode(Operation::GetChaosStatus, body)
    }

    async fn trigger(
        &self,
        operation: Operation,
        params: Vec<(&'static str, String)>,
    ) -> Result<SimulationOutcome, TransportError> {
        let result = match self.transport.call(operation, &params).await {
            Ok(body) => decode::<SimulationOutcome>(operation, body),
            Err(e) => Err(e),
        };

        let (success, message) = match &result {
            Ok(outcome) => (
                outcome.success,
                outcome.message.clone().or_else(|| outcome.error.clone()),
            ),
            Err(e) => (false, Some(e.to_string())),
        };
        self.metrics.inc_chaos_trigger(operation.name(), success);
        if let Some(logger) = &self.logger {
            logger.log_chaos_triggered(operation.name(), success, message.as_deref());
        }

        result
    }
}
