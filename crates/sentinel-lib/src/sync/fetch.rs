//! Typed snapshot fetchers over the transport

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::poller::SnapshotSource;
use crate::health::components;
use crate::models::{FullSnapshot, ServiceHealth, SummarySnapshot};
use crate::transport::{Operation, Transport, TransportError};

/// Default aggregation window of the full snapshot
pub const DEFAULT_WINDOW_HOURS: u32 = 24;

/// Fetch the comprehensive snapshot aggregated over `window_hours`
pub async fn fetch_full_snapshot(
    transport: &dyn Transport,
    window_hours: u32,
) -> Result<FullSnapshot, TransportError> {
    let body = transport
        .call(
            Operation::GetFullSnapshot,
            &[("hours", window_hours.to_string())],
        )
        .await?;
    decode(Operation::GetFullSnapshot, body)
}

/// Fetch the lightweight current-metrics snapshot
pub async fn fetch_summary_snapshot(
    transport: &dyn Transport,
) -> Result<SummarySnapshot, TransportError> {
    let body = transport.call(Operation::GetSummarySnapshot, &[]).await?;
    decode(Operation::GetSummarySnapshot, body)
}

/// Ask the backend for its own liveness and dependency status
pub async fn fetch_service_health(
    transport: &dyn Transport,
) -> Result<ServiceHealth, TransportError> {
    let body = transport.call(Operation::GetHealth, &[]).await?;
    decode(Operation::GetHealth, body)
}

pub(crate) fn decode<T: DeserializeOwned>(
    operation: Operation,
    body: serde_json::Value,
) -> Result<T, TransportError> {
    serde_json::from_value(body)
        .map_err(|e| TransportError::Unknown(format!("malformed {} response: {}", operation, e)))
}

/// Full snapshot fetcher as a polling source
#[derive(Clone)]
pub struct FullSnapshotSource {
    transport: Arc<dyn Transport>,
    window_hours: u32,
}

impl FullSnapshotSource {
    pub fn new(transport: Arc<dyn Transport>, window_hours: u32) -> Self {
        Self {
            transport,
            window_hours,
        }
    }
}

#[async_trait]
impl SnapshotSource for FullSnapshotSource {
    type Snapshot = FullSnapshot;

    fn name(&self) -> &'static str {
        "full_snapshot"
    }

    fn component(&self) -> &'static str {
        components::FULL_SNAPSHOT_LOOP
    }

    async fn fetch(&self) -> Result<FullSnapshot, TransportError> {
        fetch_full_snapshot(self.transport.as_ref(), self.window_hours).await
    }
}

/// Summary snapshot fetcher as a polling source
#[derive(Clone)]
pub struct SummarySnapshotSource {
    transport: Arc<dyn Transport>,
}

impl SummarySnapshotSource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl SnapshotSource for SummarySnapshotSource {
    type Snapshot = SummarySnapshot;

    fn name(&self) -> &'static str {
        "summary"
    }

    fn component(&self) -> &'static str {
        components::SUMMARY_LOOP
    }

    async fn fetch(&self) -> Result<SummarySnapshot, TransportError> {
        fetch_summary_snapshot(self.transport.as_ref()).await
    }
}
