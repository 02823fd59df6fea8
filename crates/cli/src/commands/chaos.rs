//! Chaos-test triggers

use anyhow::{bail, Context, Result};
use sentinel_lib::SimulationOutcome;
use serde_json::Value;
use std::time::Duration;
use tabled::Tabled;

use crate::client::Backend;
use crate::output::{print_info, print_json, print_success, print_table, print_warning, OutputFormat};

/// Row for the simulations table
#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&Value> for EventRow {
    fn from(event: &Value) -> Self {
        let text = |key: &str| event.get(key).and_then(Value::as_str).map(str::to_string);

        let detail = if let Some(count) = event.get("pods_deleted").and_then(Value::as_u64) {
            format!("{} pods deleted", count)
        } else {
            match (text("pod"), event.get("duration").and_then(Value::as_u64)) {
                (Some(pod), Some(secs)) => format!("{} for {}s", pod, secs),
                (Some(pod), None) => pod,
                (None, _) => String::new(),
            }
        };

        Self {
            kind: text("type").unwrap_or_else(|| "unknown".to_string()),
            started: text("started")
                .or_else(|| text("timestamp"))
                .unwrap_or_default(),
            detail,
        }
    }
}

fn report(action: &str, outcome: &SimulationOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(outcome)?,
        OutputFormat::Table => {
            if outcome.success {
                let message = outcome.message.as_deref().unwrap_or("accepted");
                print_success(&format!("{}: {}", action, message));
                for pod in &outcome.pods {
                    println!("  - {}", pod);
                }
            }
        }
    }

    if !outcome.success {
        bail!(
            "{} rejected by backend: {}",
            action,
            outcome.error.as_deref().unwrap_or("no reason given")
        );
    }
    Ok(())
}

pub async fn cpu_spike(
    backend: &Backend,
    target: &str,
    duration: Duration,
    format: OutputFormat,
) -> Result<()> {
    let outcome = backend
        .chaos()?
        .trigger_cpu_spike(target, duration)
        .await
        .context("Failed to start cpu spike")?;
    report("CPU spike", &outcome, format)
}

pub async fn crash(backend: &Backend, target: &str, format: OutputFormat) -> Result<()> {
    let outcome = backend
        .chaos()?
        .trigger_crash(target)
        .await
        .context("Failed to crash pod")?;
    report("Pod crash", &outcome, format)
}

pub async fn cascade(backend: &Backend, target: &str, format: OutputFormat) -> Result<()> {
    let outcome = backend
        .chaos()?
        .trigger_cascade(target)
        .await
        .context("Failed to start cascade failure")?;
    report("Cascade failure", &outcome, format)
}

pub async fn cleanup(backend: &Backend, format: OutputFormat) -> Result<()> {
    let outcome = backend
        .chaos()?
        .cleanup()
        .await
        .context("Failed to clean up simulations")?;
    report("Cleanup", &outcome, format)
}

/// List active simulations and recent chaos events
pub async fn status(backend: &Backend, format: OutputFormat) -> Result<()> {
    let status = backend
        .chaos()?
        .status()
        .await
        .context("Failed to fetch chaos status")?;

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Table => {
            if status.active_simulations.is_empty() {
                print_info("No active simulations");
            } else {
                println!("Active simulations:");
                print_table(status.active_simulations.iter().map(EventRow::from).collect());
            }

            if status.recent_events.is_empty() {
                print_warning("No recent chaos events");
            } else {
                println!("\nRecent events:");
                print_table(status.recent_events.iter().map(EventRow::from).collect());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_rows() {
        let spike = EventRow::from(&json!({
            "type": "cpu_spike",
            "started": "2024-01-01T10:00:00",
            "duration": 300,
            "pod": "stress-test-1"
        }));
        assert_eq!(spike.kind, "cpu_spike");
        assert_eq!(spike.started, "2024-01-01T10:00:00");
        assert_eq!(spike.detail, "stress-test-1 for 300s");

        let cascade = EventRow::from(&json!({
            "type": "cascade_failure",
            "pods_deleted": 2,
            "timestamp": "2024-01-01T10:05:00"
        }));
        assert_eq!(cascade.started, "2024-01-01T10:05:00");
        assert_eq!(cascade.detail, "2 pods deleted");

        let odd = EventRow::from(&json!({}));
        assert_eq!(odd.kind, "unknown");
        assert_eq!(odd.detail, "");
    }

    #[test]
    fn test_rejected_outcome_is_an_error() {
        let outcome = SimulationOutcome {
            success: false,
            error: Some("No pods found for deployment ghost".to_string()),
            ..SimulationOutcome::default()
        };

        let err = report("Pod crash", &outcome, OutputFormat::Table).unwrap_err();
        assert!(err.to_string().contains("No pods found"));
    }
}
