//! Core data models for the telemetry sync layer
//!
//! Wire snapshots are decoded leniently: every field carries a serde default
//! so one missing backend field never rejects a whole snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transport::TransportError;

/// Complete periodic pull of cluster, cost, incident and recommendation data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullSnapshot {
    pub timestamp: Option<String>,
    pub cluster: ClusterStats,
    pub metrics: ClusterMetrics,
    pub cost: CostStats,
    pub savings: SavingsStats,
    pub incidents: IncidentStats,
    pub recommendations: Vec<RawRecommendation>,
    pub health: Option<BackendHealth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterStats {
    pub namespace: String,
    pub total_pods: u32,
    pub total_deployments: u32,
    pub healthy_pods: u32,
    pub unhealthy_pods: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterMetrics {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub pod_count: u32,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostStats {
    pub hourly: f64,
    pub daily: f64,
    pub monthly: f64,
    pub total_pods: u32,
    pub total_cpu_cores: f64,
    pub total_memory_gb: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavingsStats {
    pub total_saved: f64,
    pub time_period_hours: u32,
    pub projected_monthly: f64,
    pub projected_yearly: f64,
    pub scale_down_count: u32,
    pub scale_up_count: u32,
    /// Explicit savings percent, when the backend computes one
    #[serde(alias = "savings_percent")]
    pub efficiency_score: Option<f64>,
}

/// Aggregate incident block of a full snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentStats {
    pub total: u32,
    pub successful: u32,
    pub success_rate: f64,
    pub recent: Vec<RawIncident>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendHealth {
    pub status: String,
    pub kubernetes: String,
    pub prometheus: String,
}

/// Liveness answer of the backend itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceHealth {
    pub status: String,
    pub timestamp: Option<String>,
    /// Per-dependency status, e.g. `kubernetes` and `prometheus`
    pub services: std::collections::BTreeMap<String, String>,
}

/// Lightweight, fast-cadence pull of current scalar cluster metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySnapshot {
    pub timestamp: Option<String>,
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub pods: Option<u32>,
    pub daily_cost: Option<f64>,
    pub status: Option<String>,
}

// Raw record shapes

/// Incident as delivered by the backend, in either historical shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawIncident {
    /// issue/action/result triple written by the incident tracker
    Structured(StructuredIncident),
    /// Flat record that is already display-shaped
    Legacy(LegacyIncident),
    /// Anything else; normalizes to fallback values
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredIncident {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub issue: IncidentIssue,
    #[serde(default)]
    pub action: Option<IncidentAction>,
    #[serde(default)]
    pub result: Option<IncidentResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentIssue {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub severity: Option<String>,
    pub message: Option<String>,
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentAction {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub target: Option<String>,
    pub parameters: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentResult {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub duration_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyIncident {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub severity: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "action")]
    pub action_text: Option<String>,
    #[serde(rename = "resolvedIn", alias = "resolved_in")]
    pub resolved_in: Option<String>,
}

/// Recommendation as delivered by the backend, in either historical shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRecommendation {
    /// Flat record with a stable id
    Legacy(LegacyRecommendation),
    /// Cost-advisor record keyed by recommendation type
    Advisor(AdvisorRecommendation),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyRecommendation {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, rename = "potentialSavings", alias = "potential_savings")]
    pub potential_savings: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorRecommendation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub potential_savings: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
}

// Canonical display records

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentCategory {
    Scale,
    Crash,
    Warning,
    Optimize,
}

impl IncidentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentCategory::Scale => "scale",
            IncidentCategory::Crash => "crash",
            IncidentCategory::Warning => "warning",
            IncidentCategory::Optimize => "optimize",
        }
    }

    /// Exact (case-insensitive) match on a category name
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "scale" => Some(IncidentCategory::Scale),
            "crash" => Some(IncidentCategory::Crash),
            "warning" => Some(IncidentCategory::Warning),
            "optimize" => Some(IncidentCategory::Optimize),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentSeverity {
    Success,
    Warning,
    Error,
    Info,
}

impl IncidentSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentSeverity::Success => "success",
            IncidentSeverity::Warning => "warning",
            IncidentSeverity::Error => "error",
            IncidentSeverity::Info => "info",
        }
    }

    /// Exact (case-insensitive) match on a display severity name
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "success" => Some(IncidentSeverity::Success),
            "warning" => Some(IncidentSeverity::Warning),
            "error" => Some(IncidentSeverity::Error),
            "info" => Some(IncidentSeverity::Info),
            _ => None,
        }
    }
}

/// Canonical incident record consumed by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    /// Localized display time
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub category: IncidentCategory,
    pub severity: IncidentSeverity,
    pub title: String,
    #[serde(rename = "action")]
    pub action_text: String,
    #[serde(rename = "resolvedIn")]
    pub resolved_in: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSeverity {
    High,
    Medium,
    Low,
}

impl RecommendationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationSeverity::High => "high",
            RecommendationSeverity::Medium => "medium",
            RecommendationSeverity::Low => "low",
        }
    }
}

/// Canonical recommendation record consumed by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: RecommendationSeverity,
    #[serde(rename = "potentialSavings")]
    pub potential_savings: String,
}

// Derived view models

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PodCounts {
    pub total: u32,
    pub healthy: u32,
    pub unhealthy: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostView {
    pub daily: f64,
    pub saved_today: f64,
    pub monthly_projection: f64,
    pub monthly_savings: f64,
    pub savings_percent: f64,
}

/// Reconciled metrics object rendered by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedView {
    pub cpu: f64,
    pub memory: f64,
    pub pods: PodCounts,
    pub cost: CostView,
}

/// One sample of the rolling chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    /// Local `HH:MM` axis label
    pub time: String,
    pub cpu: f64,
    pub memory: f64,
    pub pods: u32,
    /// Incidents that occurred inside this point's interval
    pub incidents: u32,
}

/// Coarse connectivity state derived from the full-snapshot loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Nothing received and nothing failed yet
    Loading,
    /// Failed before any full snapshot ever landed
    Unreachable,
    /// Showing stale data after a failure
    Degraded,
    Live,
}

/// Everything the presentation layer consumes, in one value
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub merged: Option<MergedView>,
    pub chart: Vec<ChartPoint>,
    pub incidents: Vec<Incident>,
    pub recommendations: Vec<Recommendation>,
    #[serde(serialize_with = "serialize_error")]
    pub last_error: Option<TransportError>,
    pub loading: bool,
    pub connection: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_stats: Option<IncidentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_health: Option<BackendHealth>,
    pub generated_at: DateTime<Utc>,
}

/// Incident aggregates without the raw records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncidentSummary {
    pub total: u32,
    pub successful: u32,
    pub success_rate: f64,
}

fn serialize_error<S>(error: &Option<TransportError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Result of a chaos-test trigger, surfaced unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOutcome {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub duration: Option<u64>,
    pub pod: Option<String>,
    pub pods_deleted: Option<u32>,
    pub pods: Vec<String>,
}

/// Active simulations and recent chaos events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosStatus {
    pub success: bool,
    pub active_simulations: Vec<serde_json::Value>,
    pub recent_events: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_snapshot_tolerates_missing_blocks() {
        let snapshot: FullSnapshot = serde_json::from_value(json!({
            "metrics": { "cpu_usage": 12.5 }
        }))
        .unwrap();

        assert_eq!(snapshot.metrics.cpu_usage, 12.5);
        assert_eq!(snapshot.cluster.total_pods, 0);
        assert!(snapshot.recommendations.is_empty());
        assert!(snapshot.savings.efficiency_score.is_none());
    }

    #[test]
    fn test_raw_incident_shape_detection() {
        let structured: RawIncident = serde_json::from_value(json!({
            "id": "a1b2c3d4",
            "timestamp": "2024-01-01T10:00:00",
            "issue": { "type": "cpu_overload", "severity": "high" },
            "action": { "type": "scale_up", "target": "nginx-demo" }
        }))
        .unwrap();
        assert!(matches!(structured, RawIncident::Structured(_)));

        let legacy: RawIncident = serde_json::from_value(json!({
            "id": "1",
            "timestamp": "10:00:00",
            "type": "scale",
            "severity": "success",
            "title": "CPU Overload Detected"
        }))
        .unwrap();
        assert!(matches!(legacy, RawIncident::Legacy(_)));

        let other: RawIncident = serde_json::from_value(json!("garbage")).unwrap();
        assert!(matches!(other, RawIncident::Other(_)));
    }

    #[test]
    fn test_raw_recommendation_shape_detection() {
        let advisor: RawRecommendation = serde_json::from_value(json!({
            "type": "reduce_baseline",
            "severity": "medium",
            "title": "Reduce baseline replica count",
            "potential_savings": "$15-30/month"
        }))
        .unwrap();
        assert!(matches!(advisor, RawRecommendation::Advisor(_)));

        let legacy: RawRecommendation = serde_json::from_value(json!({
            "id": "rec-1",
            "title": "Right-size nginx",
            "potentialSavings": "$12/month"
        }))
        .unwrap();
        match legacy {
            RawRecommendation::Legacy(rec) => {
                assert_eq!(rec.potential_savings.as_deref(), Some("$12/month"))
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_category_and_severity_parse() {
        assert_eq!(IncidentCategory::parse("Scale"), Some(IncidentCategory::Scale));
        assert_eq!(IncidentCategory::parse("cpu_overload"), None);
        assert_eq!(IncidentSeverity::parse("INFO"), Some(IncidentSeverity::Info));
        assert_eq!(IncidentSeverity::parse("critical"), None);
    }
}
