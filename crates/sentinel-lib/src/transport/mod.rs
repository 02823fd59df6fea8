//! Transport to the SentinelOps backend
//!
//! This module provides:
//! - The fixed set of named remote operations and their wire mapping
//! - A typed failure taxonomy shared by every caller
//! - An HTTP implementation with a per-call timeout
//!
//! The transport never retries; retry policy belongs to the polling loops.

mod http;

pub use http::{ClientConfig, HttpTransport};

use async_trait::async_trait;
use std::fmt;

/// Typed failure of a single remote call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("backend returned HTTP {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected transport failure: {0}")]
    Unknown(String),
}

/// HTTP verb of a remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Named remote operations consumed by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetFullSnapshot,
    GetSummarySnapshot,
    TriggerCpuSpike,
    TriggerCrash,
    TriggerCascade,
    CleanupSimulations,
    GetChaosStatus,
    GetHealth,
}

impl Operation {
    pub fn method(&self) -> Method {
        match self {
            Operation::GetFullSnapshot
            | Operation::GetSummarySnapshot
            | Operation::GetChaosStatus
            | Operation::GetHealth => Method::Get,
            Operation::TriggerCpuSpike
            | Operation::TriggerCrash
            | Operation::TriggerCascade
            | Operation::CleanupSimulations => Method::Post,
        }
    }

    /// Path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Operation::GetFullSnapshot => "dashboard/stats",
            Operation::GetSummarySnapshot => "stats/summary",
            Operation::TriggerCpuSpike => "simulate/cpu_spike",
            Operation::TriggerCrash => "simulate/crash",
            Operation::TriggerCascade => "simulate/cascade",
            Operation::CleanupSimulations => "simulate/cleanup",
            Operation::GetChaosStatus => "chaos/status",
            Operation::GetHealth => "health",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetFullSnapshot => "get_full_snapshot",
            Operation::GetSummarySnapshot => "get_summary_snapshot",
            Operation::TriggerCpuSpike => "trigger_cpu_spike",
            Operation::TriggerCrash => "trigger_crash",
            Operation::TriggerCascade => "trigger_cascade",
            Operation::CleanupSimulations => "cleanup_simulations",
            Operation::GetChaosStatus => "get_chaos_status",
            Operation::GetHealth => "get_health",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Query parameters of one call
pub type Params = [(&'static str, String)];

/// Request/response access to the backend
///
/// Implementations must be stateless between calls so that both polling
/// loops can share one instance.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        operation: Operation,
        params: &Params,
    ) -> Result<serde_json::Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_wire_mapping() {
        assert_eq!(Operation::GetFullSnapshot.path(), "dashboard/stats");
        assert_eq!(Operation::GetFullSnapshot.method(), Method::Get);
        assert_eq!(Operation::TriggerCpuSpike.method(), Method::Post);
        assert_eq!(Operation::CleanupSimulations.path(), "simulate/cleanup");
        assert_eq!(Operation::GetSummarySnapshot.to_string(), "get_summary_snapshot");
    }

    #[test]
    fn test_transport_error_messages() {
        assert_eq!(TransportError::Timeout.to_string(), "request timed out");
        assert_eq!(
            TransportError::HttpStatus(503).to_string(),
            "backend returned HTTP 503"
        );
        assert!(TransportError::Network("refused".into())
            .to_string()
            .contains("refused"));
    }
}
