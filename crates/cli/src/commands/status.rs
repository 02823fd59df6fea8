//! Reconciled cluster status, one-shot or live

use anyhow::{Context, Result};
use chrono::Local;
use sentinel_lib::{DashboardView, MergedView};
use std::time::Duration;
use tabled::Tabled;
use tracing::debug;

use crate::client::Backend;
use crate::output::{
    color_connection, color_status, color_usage, format_bar, format_currency, format_percent,
    print_info, print_json, print_table, print_warning, OutputFormat,
};

const BAR_WIDTH: usize = 20;

/// Row for the status table
#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl StatusRow {
    fn new(metric: &'static str, value: impl Into<String>) -> Self {
        Self {
            metric,
            value: value.into(),
        }
    }
}

fn metric_rows(merged: &MergedView) -> Vec<StatusRow> {
    let cost = &merged.cost;
    vec![
        StatusRow::new(
            "CPU",
            format!("{} {}", color_usage(merged.cpu), format_bar(merged.cpu, BAR_WIDTH)),
        ),
        StatusRow::new(
            "Memory",
            format!(
                "{} {}",
                color_usage(merged.memory),
                format_bar(merged.memory, BAR_WIDTH)
            ),
        ),
        StatusRow::new(
            "Pods",
            format!(
                "{} ({} healthy, {} unhealthy)",
                merged.pods.total, merged.pods.healthy, merged.pods.unhealthy
            ),
        ),
        StatusRow::new("Daily cost", format_currency(cost.daily)),
        StatusRow::new("Saved today", format_currency(cost.saved_today)),
        StatusRow::new("Monthly projection", format_currency(cost.monthly_projection)),
        StatusRow::new("Monthly savings", format_currency(cost.monthly_savings)),
        StatusRow::new("Savings", format_percent(cost.savings_percent)),
    ]
}

fn render_table(view: &DashboardView, api_url: &str) {
    println!(
        "SentinelOps @ {}  [{}]  {}",
        api_url,
        color_connection(view.connection),
        view.generated_at.with_timezone(&Local).format("%H:%M:%S")
    );

    let Some(merged) = &view.merged else {
        print_info("Waiting for the first full snapshot");
        return;
    };

    let mut rows = metric_rows(merged);
    if let Some(stats) = view.incident_stats {
        rows.push(StatusRow::new(
            "Incidents",
            format!("{} ({:.1}% auto-resolved)", stats.total, stats.success_rate),
        ));
    }
    if let Some(health) = &view.backend_health {
        rows.push(StatusRow::new(
            "Backend",
            format!(
                "{} (kubernetes: {}, prometheus: {})",
                color_status(&health.status),
                color_status(&health.kubernetes),
                color_status(&health.prometheus)
            ),
        ));
    }
    print_table(rows);

    if let Some(err) = &view.last_error {
        print_warning(&format!("Showing last known data: {}", err));
    }
}

/// Poll once and print the reconciled view
pub async fn show_status(backend: &Backend, format: OutputFormat) -> Result<()> {
    let view = backend.load_view().await?;

    match format {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Table => render_table(&view, backend.api_url()),
    }

    Ok(())
}

/// Run both polling loops and redraw every `refresh` until Ctrl-C
pub async fn watch(backend: &Backend, refresh: Duration, format: OutputFormat) -> Result<()> {
    let sync = backend.telemetry()?;
    sync.start().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(refresh);

    let result = loop {
        tokio::select! {
            signal = &mut shutdown => {
                break signal.context("Failed to listen for Ctrl-C");
            }
            _ = ticker.tick() => {
                let view = sync.view().await;
                match format {
                    OutputFormat::Json => match serde_json::to_string(&view) {
                        Ok(line) => println!("{}", line),
                        Err(e) => break Err(e.into()),
                    },
                    OutputFormat::Table => {
                        print!("\x1B[2J\x1B[H");
                        render_table(&view, backend.api_url());
                    }
                }
            }
        }
    };

    debug!("Stopping live view");
    sync.stop().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_lib::{CostView, PodCounts};

    #[test]
    fn test_metric_rows_cover_the_merged_view() {
        let merged = MergedView {
            cpu: 42.0,
            memory: 63.5,
            pods: PodCounts {
                total: 7,
                healthy: 6,
                unhealthy: 1,
            },
            cost: CostView {
                daily: 12.5,
                saved_today: 3.2,
                monthly_projection: 375.0,
                monthly_savings: 90.0,
                savings_percent: 24.0,
            },
        };

        let rows = metric_rows(&merged);
        let value = |name: &str| {
            rows.iter()
                .find(|row| row.metric == name)
                .map(|row| row.value.clone())
                .unwrap()
        };

        assert_eq!(value("Pods"), "7 (6 healthy, 1 unhealthy)");
        assert_eq!(value("Daily cost"), "$12.50");
        assert_eq!(value("Monthly savings"), "$90.00");
        assert_eq!(value("Savings"), "24.0%");
        assert!(value("Memory").contains("63.5%"));
    }
}
