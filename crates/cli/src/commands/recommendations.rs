//! Recommendation listing

use anyhow::Result;
use sentinel_lib::Recommendation;
use tabled::Tabled;

use crate::client::Backend;
use crate::output::{
    color_recommendation_severity, print_json, print_table, print_warning, truncate, OutputFormat,
};

/// Row for recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Savings")]
    savings: String,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(rec: &Recommendation) -> Self {
        Self {
            id: truncate(&rec.id, 24),
            severity: color_recommendation_severity(rec.severity),
            title: truncate(&rec.title, 40),
            description: truncate(&rec.description, 60),
            savings: rec.potential_savings.clone(),
        }
    }
}

/// Show cost recommendations from the latest full snapshot
pub async fn list_recommendations(backend: &Backend, format: OutputFormat) -> Result<()> {
    let view = backend.load_view().await?;

    match format {
        OutputFormat::Json => print_json(&view.recommendations)?,
        OutputFormat::Table => {
            if view.recommendations.is_empty() {
                print_warning("No recommendations found");
                return Ok(());
            }

            print_table(view.recommendations.iter().map(RecommendationRow::from).collect());
            println!("\nTotal: {} recommendations", view.recommendations.len());
        }
    }

    Ok(())
}
