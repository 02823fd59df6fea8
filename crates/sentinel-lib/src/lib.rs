//! Live telemetry sync for the SentinelOps dashboard
//!
//! This crate provides the core functionality for:
//! - Timed, typed requests against the backend
//! - Two independently cadenced, cancellable polling loops
//! - Reconciliation of full and summary snapshots into one view
//! - Rolling chart series synthesis
//! - Normalization of incident and recommendation records
//! - Chaos-test triggers
//! - Health checks and observability

pub mod chaos;
pub mod health;
pub mod models;
pub mod observability;
pub mod sync;
pub mod transport;
pub mod view;

pub use chaos::ChaosClient;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{StructuredLogger, SyncMetrics};
pub use sync::{SyncConfig, SyncConfigBuilder, TelemetrySync};
pub use transport::{ClientConfig, HttpTransport, Transport, TransportError};
