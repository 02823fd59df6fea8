//! Backend liveness check

use anyhow::{Context, Result};
use sentinel_lib::sync::fetch_service_health;
use tabled::Tabled;

use crate::client::Backend;
use crate::output::{color_status, print_json, print_success, print_table, print_warning, OutputFormat};

/// Row for backend dependencies table
#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Ask the backend whether it and its dependencies are up
pub async fn check_health(backend: &Backend, format: OutputFormat) -> Result<()> {
    let transport = backend.transport()?;
    let health = fetch_service_health(transport.as_ref())
        .await
        .with_context(|| format!("Health check against {} failed", backend.api_url()))?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            if health.status.eq_ignore_ascii_case("healthy") {
                print_success(&format!("Backend at {} is healthy", backend.api_url()));
            } else {
                print_warning(&format!(
                    "Backend at {} reports {}",
                    backend.api_url(),
                    color_status(&health.status)
                ));
            }

            if !health.services.is_empty() {
                let rows = health
                    .services
                    .iter()
                    .map(|(service, status)| ServiceRow {
                        service: service.clone(),
                        status: color_status(status),
                    })
                    .collect();
                print_table(rows);
            }
        }
    }

    Ok(())
}
