//! Live synchronization with the SentinelOps backend
//!
//! This module provides:
//! - Typed fetchers for the full and summary snapshots
//! - Cancellable polling loops with per-loop snapshot/error slots
//! - The orchestrator that owns both loops and builds the dashboard view

mod fetch;
mod poller;
mod telemetry;


pub(crate) use fetch::decode;
pub use fetch::{
    fetch_full_snapshot, fetch_service_health, fetch_summary_snapshot, FullSnapshotSource,
    SummarySnapshotSource, DEFAULT_WINDOW_HOURS,
};
pub use poller::{
    ApplyOutcome, PollLoop, PollSlot, PollStats, PollerHandle, RefreshHandle, SharedSlot,
    SnapshotSource, StopToken,
};
pub use telemetry::{
    connection_state, RefreshOutcome, SyncConfig, SyncConfigBuilder, TelemetrySync,
};
