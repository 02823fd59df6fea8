//! Rolling one-hour chart series

use anyhow::Result;
use sentinel_lib::ChartPoint;
use tabled::Tabled;

use crate::client::Backend;
use crate::output::{format_bar, format_percent, print_json, print_table, OutputFormat};

const BAR_WIDTH: usize = 20;

/// Row for chart table
#[derive(Tabled)]
struct ChartRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "")]
    cpu_bar: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Pods")]
    pods: u32,
    #[tabled(rename = "Incidents")]
    incidents: u32,
}

impl From<&ChartPoint> for ChartRow {
    fn from(point: &ChartPoint) -> Self {
        Self {
            time: point.time.clone(),
            cpu: format_percent(point.cpu),
            cpu_bar: format_bar(point.cpu, BAR_WIDTH),
            memory: format_percent(point.memory),
            pods: point.pods,
            incidents: point.incidents,
        }
    }
}

/// Show the 24-point series ending now
pub async fn show_chart(backend: &Backend, format: OutputFormat) -> Result<()> {
    let view = backend.load_view().await?;

    match format {
        OutputFormat::Json => print_json(&view.chart)?,
        OutputFormat::Table => {
            print_table(view.chart.iter().map(ChartRow::from).collect());
            println!("\nLast point is live; earlier points are estimated");
        }
    }

    Ok(())
}
