//! Incident history

use anyhow::Result;
use sentinel_lib::Incident;
use tabled::Tabled;

use crate::client::Backend;
use crate::output::{color_incident_severity, print_json, print_table, print_warning, truncate, OutputFormat};

/// Row for incidents table
#[derive(Tabled)]
struct IncidentRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Type")]
    category: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Resolved In")]
    resolved_in: String,
}

impl From<&Incident> for IncidentRow {
    fn from(incident: &Incident) -> Self {
        Self {
            time: incident.timestamp.clone(),
            category: incident.category.as_str().to_string(),
            severity: color_incident_severity(incident.severity),
            title: truncate(&incident.title, 40),
            action: truncate(&incident.action_text, 40),
            resolved_in: incident.resolved_in.clone(),
        }
    }
}

/// Show recent incidents, newest first as delivered by the backend
pub async fn list_incidents(backend: &Backend, limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let view = backend.load_view().await?;

    let mut incidents = view.incidents;
    if let Some(limit) = limit {
        incidents.truncate(limit);
    }

    match format {
        OutputFormat::Json => print_json(&incidents)?,
        OutputFormat::Table => {
            if incidents.is_empty() {
                print_warning("No incidents found");
                return Ok(());
            }

            let shown = incidents.len();
            print_table(incidents.iter().map(IncidentRow::from).collect());

            match view.incident_stats {
                Some(stats) => println!(
                    "\nShowing {} of {} incidents ({:.1}% auto-resolved)",
                    shown, stats.total, stats.success_rate
                ),
                None => println!("\nShowing {} incidents", shown),
            }
        }
    }

    Ok(())
}
