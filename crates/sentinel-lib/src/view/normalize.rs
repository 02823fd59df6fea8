//! Normalization of incident and recommendation records
//!
//! Both backend shapes of each record converge on one canonical display
//! shape here. Every function is total: missing or malformed optional
//! fields map to documented fallbacks instead of failing.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;

use crate::models::{
    AdvisorRecommendation, Incident, IncidentAction, IncidentCategory, IncidentSeverity,
    LegacyIncident, LegacyRecommendation, RawIncident, RawRecommendation, Recommendation,
    RecommendationSeverity, StructuredIncident,
};

/// Marker for values the backend did not provide
pub const NOT_AVAILABLE: &str = "N/A";

const DEFAULT_ACTION_TEXT: &str = "Action taken";
const UNKNOWN_ISSUE: &str = "unknown";
const UNKNOWN_TARGET: &str = "unknown";

/// Map any incident shape to the canonical record
pub fn normalize_incident(raw: RawIncident) -> Incident {
    match raw {
        RawIncident::Structured(incident) => normalize_structured(incident),
        RawIncident::Legacy(incident) => normalize_legacy(incident),
        RawIncident::Other(value) => normalize_other(&value),
    }
}

/// Normalize a list of incidents, preserving order
pub fn normalize_incidents(raw: impl IntoIterator<Item = RawIncident>) -> Vec<Incident> {
    raw.into_iter().map(normalize_incident).collect()
}

fn normalize_structured(incident: StructuredIncident) -> Incident {
    let issue_type = incident
        .issue
        .kind
        .as_deref()
        .unwrap_or(UNKNOWN_ISSUE)
        .to_string();
    let occurred_at = incident.timestamp.as_deref().and_then(parse_timestamp);
    let timestamp = match occurred_at {
        Some(at) => display_time(at),
        None => incident
            .timestamp
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    };

    let resolved_in = incident
        .result
        .as_ref()
        .and_then(|r| r.duration_ms)
        .filter(|ms| ms.is_finite())
        .map(|ms| format!("{:.1}s", ms / 1000.0))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    Incident {
        id: incident.id.unwrap_or_else(|| fallback_id(&issue_type, occurred_at)),
        timestamp,
        occurred_at,
        category: categorize(&issue_type),
        severity: map_severity(incident.issue.severity.as_deref().unwrap_or_default()),
        title: issue_title(&issue_type),
        action_text: action_text(incident.action.as_ref()),
        resolved_in,
    }
}

fn normalize_legacy(incident: LegacyIncident) -> Incident {
    let category = incident
        .kind
        .as_deref()
        .map(|kind| IncidentCategory::parse(kind).unwrap_or_else(|| categorize(kind)))
        .unwrap_or(IncidentCategory::Optimize);
    let severity = incident
        .severity
        .as_deref()
        .map(|s| IncidentSeverity::parse(s).unwrap_or_else(|| map_severity(s)))
        .unwrap_or(IncidentSeverity::Success);
    let title = incident
        .title
        .clone()
        .or_else(|| incident.kind.as_deref().map(issue_title))
        .unwrap_or_else(|| issue_title(UNKNOWN_ISSUE));

    Incident {
        id: incident
            .id
            .unwrap_or_else(|| fallback_id(category.as_str(), incident.occurred_at)),
        timestamp: incident
            .timestamp
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        occurred_at: incident.occurred_at,
        category,
        severity,
        action_text: incident.action_text.unwrap_or_else(|| title.clone()),
        title,
        resolved_in: incident
            .resolved_in
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

fn normalize_other(value: &serde_json::Value) -> Incident {
    let id = value
        .get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| fallback_id(UNKNOWN_ISSUE, None));

    Incident {
        id,
        timestamp: NOT_AVAILABLE.to_string(),
        occurred_at: None,
        category: IncidentCategory::Optimize,
        severity: IncidentSeverity::Success,
        title: issue_title(UNKNOWN_ISSUE),
        action_text: DEFAULT_ACTION_TEXT.to_string(),
        resolved_in: NOT_AVAILABLE.to_string(),
    }
}

/// Display category of an issue type (case-insensitive containment)
pub fn categorize(issue_type: &str) -> IncidentCategory {
    let kind = issue_type.to_lowercase();
    if kind.contains("overload") || kind.contains("spike") {
        IncidentCategory::Scale
    } else if kind.contains("crash") || kind.contains("unhealthy") {
        IncidentCategory::Crash
    } else if kind.contains("warning") {
        IncidentCategory::Warning
    } else {
        IncidentCategory::Optimize
    }
}

/// Display severity of a backend severity string
pub fn map_severity(severity: &str) -> IncidentSeverity {
    match severity.to_lowercase().as_str() {
        "critical" | "high" => IncidentSeverity::Error,
        "medium" => IncidentSeverity::Warning,
        "low" => IncidentSeverity::Info,
        _ => IncidentSeverity::Success,
    }
}

/// "cpu_overload" -> "Cpu Overload Detected"
pub fn issue_title(issue_type: &str) -> String {
    let words: Vec<String> = issue_type
        .split('_')
        .flat_map(|part| part.split(' '))
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();
    format!("{} Detected", words.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human description of a remediation action
pub fn action_text(action: Option<&IncidentAction>) -> String {
    let Some(action) = action else {
        return DEFAULT_ACTION_TEXT.to_string();
    };

    let kind = action.kind.as_deref().unwrap_or_default();
    let target = action.target.as_deref().unwrap_or(UNKNOWN_TARGET);

    match kind {
        "scale_up" | "scale_down" => {
            let from = parameter(action, "from");
            let to = parameter(action, "to");
            format!("Scaled {}: {} → {} pods", target, from, to)
        }
        "restart" => format!("Restarted {}", target),
        "" => DEFAULT_ACTION_TEXT.to_string(),
        other => format!("{} for {}", other.replace('_', " "), target),
    }
}

fn parameter(action: &IncidentAction, key: &str) -> String {
    match action.parameters.as_ref().and_then(|p| p.get(key)) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => "?".to_string(),
    }
}

/// Parse a backend timestamp.
///
/// RFC 3339 first; naive ISO timestamps are read as local time, which is
/// what the backend writes.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

fn display_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn fallback_id(kind: &str, at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => format!("{}-{}", kind, at.timestamp_millis()),
        None => kind.to_string(),
    }
}

impl From<Incident> for RawIncident {
    fn from(incident: Incident) -> Self {
        RawIncident::Legacy(LegacyIncident {
            id: Some(incident.id),
            timestamp: Some(incident.timestamp),
            occurred_at: incident.occurred_at,
            kind: Some(incident.category.as_str().to_string()),
            severity: Some(incident.severity.as_str().to_string()),
            title: Some(incident.title),
            action_text: Some(incident.action_text),
            resolved_in: Some(incident.resolved_in),
        })
    }
}

// Recommendations

/// Map any recommendation shape to the canonical record
pub fn normalize_recommendation(raw: RawRecommendation) -> Recommendation {
    match raw {
        RawRecommendation::Legacy(rec) => normalize_legacy_recommendation(rec),
        RawRecommendation::Advisor(rec) => normalize_advisor_recommendation(rec),
        RawRecommendation::Other(value) => normalize_other_recommendation(&value),
    }
}

/// Normalize a list of recommendations and make their ids unique
pub fn normalize_recommendations(
    raw: impl IntoIterator<Item = RawRecommendation>,
) -> Vec<Recommendation> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    raw.into_iter()
        .map(normalize_recommendation)
        .map(|mut rec| {
            let count = seen.entry(rec.id.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                rec.id = format!("{}-{}", rec.id, count);
            }
            rec
        })
        .collect()
}

fn normalize_legacy_recommendation(rec: LegacyRecommendation) -> Recommendation {
    Recommendation {
        title: rec.title.unwrap_or_else(|| rec.id.clone()),
        id: rec.id,
        description: rec.description.unwrap_or_default(),
        severity: map_recommendation_severity(rec.severity.as_deref().unwrap_or_default()),
        potential_savings: savings_or_marker(rec.potential_savings),
    }
}

fn normalize_advisor_recommendation(rec: AdvisorRecommendation) -> Recommendation {
    let title = rec
        .title
        .clone()
        .unwrap_or_else(|| rec.kind.replace('_', " "));
    let description = match (rec.description, rec.action) {
        (Some(description), _) => description,
        (None, Some(action)) => action,
        (None, None) => String::new(),
    };

    Recommendation {
        id: if rec.kind.is_empty() {
            slug(&title)
        } else {
            rec.kind
        },
        title,
        description,
        severity: map_recommendation_severity(rec.severity.as_deref().unwrap_or_default()),
        potential_savings: savings_or_marker(rec.potential_savings),
    }
}

fn normalize_other_recommendation(value: &serde_json::Value) -> Recommendation {
    let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let title = field("title").unwrap_or_else(|| "Recommendation".to_string());

    Recommendation {
        id: slug(&title),
        description: field("description").unwrap_or_default(),
        severity: map_recommendation_severity(&field("severity").unwrap_or_default()),
        potential_savings: NOT_AVAILABLE.to_string(),
        title,
    }
}

/// Canonical severity of a recommendation
pub fn map_recommendation_severity(severity: &str) -> RecommendationSeverity {
    match severity.to_lowercase().as_str() {
        "high" | "critical" | "error" => RecommendationSeverity::High,
        "medium" | "warning" => RecommendationSeverity::Medium,
        _ => RecommendationSeverity::Low,
    }
}

fn savings_or_marker(savings: Option<String>) -> String {
    savings
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn slug(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "recommendation".to_string()
    } else {
        slug
    }
}

impl From<Recommendation> for RawRecommendation {
    fn from(rec: Recommendation) -> Self {
        RawRecommendation::Legacy(LegacyRecommendation {
            id: rec.id,
            title: Some(rec.title),
            description: Some(rec.description),
            severity: Some(rec.severity.as_str().to_string()),
            potential_savings: Some(rec.potential_savings),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawIncident {
        serde_json::from_value(value).unwrap()
    }

    fn structured_scale_up() -> RawIncident {
        raw(json!({
            "id": "3f2a9c1d",
            "timestamp": "2024-05-01T12:30:00Z",
            "issue": {
                "type": "cpu_overload",
                "severity": "high",
                "message": "CPU at 92%",
                "resource": "nginx-demo"
            },
            "action": {
                "type": "scale_up",
                "target": "nginx-demo",
                "parameters": { "from": 2, "to": 4 }
            },
            "result": { "success": true, "duration_ms": 1530 }
        }))
    }

    #[test]
    fn test_structured_incident_normalization() {
        let incident = normalize_incident(structured_scale_up());

        assert_eq!(incident.id, "3f2a9c1d");
        assert_eq!(incident.category, IncidentCategory::Scale);
        assert_eq!(incident.severity, IncidentSeverity::Error);
        assert_eq!(incident.title, "Cpu Overload Detected");
        assert_eq!(incident.action_text, "Scaled nginx-demo: 2 → 4 pods");
        assert_eq!(incident.resolved_in, "1.5s");
        assert_eq!(
            incident.occurred_at,
            Some(DateTime::parse_from_rfc3339("2024-05-01T12:30:00Z").unwrap().with_timezone(&Utc))
        );
    }

    #[test]
    fn test_category_mapping_examples() {
        assert_eq!(categorize("cpu_overload"), IncidentCategory::Scale);
        assert_eq!(categorize("memory_spike"), IncidentCategory::Scale);
        assert_eq!(categorize("pod_crash_detected"), IncidentCategory::Crash);
        assert_eq!(categorize("Pod_Unhealthy"), IncidentCategory::Crash);
        assert_eq!(categorize("latency_warning"), IncidentCategory::Warning);
        assert_eq!(categorize("unused_resource"), IncidentCategory::Optimize);
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(map_severity("critical"), IncidentSeverity::Error);
        assert_eq!(map_severity("HIGH"), IncidentSeverity::Error);
        assert_eq!(map_severity("medium"), IncidentSeverity::Warning);
        assert_eq!(map_severity("low"), IncidentSeverity::Info);
        assert_eq!(map_severity("bogus"), IncidentSeverity::Success);
        assert_eq!(map_severity(""), IncidentSeverity::Success);
    }

    #[test]
    fn test_action_text_variants() {
        let restart = IncidentAction {
            kind: Some("restart".into()),
            target: Some("api-gateway".into()),
            parameters: None,
        };
        assert_eq!(action_text(Some(&restart)), "Restarted api-gateway");

        let scale_down = IncidentAction {
            kind: Some("scale_down".into()),
            target: Some("nginx-demo".into()),
            parameters: None,
        };
        assert_eq!(action_text(Some(&scale_down)), "Scaled nginx-demo: ? → ? pods");

        let other = IncidentAction {
            kind: Some("delete_pod".into()),
            target: Some("nginx-demo-7f9".into()),
            parameters: None,
        };
        assert_eq!(action_text(Some(&other)), "delete pod for nginx-demo-7f9");

        assert_eq!(action_text(None), "Action taken");
    }

    #[test]
    fn test_missing_sub_fields_fall_back() {
        let incident = normalize_incident(raw(json!({ "issue": {} })));

        assert_eq!(incident.id, "unknown");
        assert_eq!(incident.timestamp, NOT_AVAILABLE);
        assert_eq!(incident.title, "Unknown Detected");
        assert_eq!(incident.category, IncidentCategory::Optimize);
        assert_eq!(incident.severity, IncidentSeverity::Success);
        assert_eq!(incident.action_text, "Action taken");
        assert_eq!(incident.resolved_in, NOT_AVAILABLE);
    }

    #[test]
    fn test_unparseable_timestamp_is_kept_verbatim() {
        let incident = normalize_incident(raw(json!({
            "timestamp": "yesterday",
            "issue": { "type": "pod_crash" }
        })));

        assert_eq!(incident.timestamp, "yesterday");
        assert!(incident.occurred_at.is_none());
    }

    #[test]
    fn test_legacy_incident_passes_through() {
        let incident = normalize_incident(raw(json!({
            "id": "7",
            "timestamp": "10:42:07",
            "type": "crash",
            "severity": "warning",
            "title": "Pod Restarted",
            "action_text": "Restarted nginx-demo",
            "resolvedIn": "2.1s"
        })));

        assert_eq!(incident.category, IncidentCategory::Crash);
        assert_eq!(incident.severity, IncidentSeverity::Warning);
        assert_eq!(incident.timestamp, "10:42:07");
        assert_eq!(incident.action_text, "Restarted nginx-demo");
        assert_eq!(incident.resolved_in, "2.1s");
    }

    #[test]
    fn test_non_object_incident_is_total() {
        let incident = normalize_incident(raw(json!(42)));
        assert_eq!(incident.title, "Unknown Detected");
        assert_eq!(incident.resolved_in, NOT_AVAILABLE);
    }

    #[test]
    fn test_normalize_incident_is_idempotent() {
        let inputs = vec![
            structured_scale_up(),
            raw(json!({ "issue": { "type": "latency_warning", "severity": "medium" } })),
            raw(json!({ "id": "x", "type": "cpu_spike", "severity": "critical" })),
            raw(json!(null)),
        ];

        for input in inputs {
            let once = normalize_incident(input);
            let twice = normalize_incident(RawIncident::from(once.clone()));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_canonical_incident_survives_json() {
        let once = normalize_incident(structured_scale_up());
        let json = serde_json::to_value(&once).unwrap();
        let again = normalize_incident(serde_json::from_value(json).unwrap());

        assert_eq!(once, again);
    }

    #[test]
    fn test_advisor_recommendation_normalization() {
        let rec: RawRecommendation = serde_json::from_value(json!({
            "type": "reduce_baseline",
            "severity": "medium",
            "title": "Reduce baseline replica count",
            "description": "System frequently scales down but rarely scales up",
            "action": "Consider reducing minimum replicas",
            "potential_savings": "$15-30/month",
            "confidence": "high"
        }))
        .unwrap();

        let rec = normalize_recommendation(rec);
        assert_eq!(rec.id, "reduce_baseline");
        assert_eq!(rec.severity, RecommendationSeverity::Medium);
        assert_eq!(rec.potential_savings, "$15-30/month");
        assert_eq!(
            rec.description,
            "System frequently scales down but rarely scales up"
        );
    }

    #[test]
    fn test_recommendation_severity_and_savings_fallbacks() {
        let rec: RawRecommendation = serde_json::from_value(json!({
            "type": "no_activity",
            "severity": "info",
            "title": "Low activity detected"
        }))
        .unwrap();

        let rec = normalize_recommendation(rec);
        assert_eq!(rec.severity, RecommendationSeverity::Low);
        assert_eq!(rec.potential_savings, NOT_AVAILABLE);
    }

    #[test]
    fn test_recommendation_ids_are_unique_per_list() {
        let raw: Vec<RawRecommendation> = serde_json::from_value(json!([
            { "type": "review_scaling", "title": "Review nginx-demo scaling" },
            { "type": "review_scaling", "title": "Review api scaling" },
            { "title": "No type at all" }
        ]))
        .unwrap();

        let recs = normalize_recommendations(raw);
        let ids: Vec<&str> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["review_scaling", "review_scaling-2", "no-type-at-all"]);
    }

    #[test]
    fn test_normalize_recommendation_is_idempotent() {
        let rec: RawRecommendation = serde_json::from_value(json!({
            "type": "optimized",
            "severity": "success",
            "title": "System is well-optimized",
            "potential_savings": "N/A"
        }))
        .unwrap();

        let once = normalize_recommendation(rec);
        let twice = normalize_recommendation(RawRecommendation::from(once.clone()));
        assert_eq!(once, twice);
    }
}
