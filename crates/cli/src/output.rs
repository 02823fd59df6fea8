//! Output formatting utilities

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use colored::Colorize;
use sentinel_lib::{ConnectionState, IncidentSeverity, RecommendationSeverity};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Format named in the config file, table when unset
    pub fn from_config(value: Option<&str>) -> Result<Self> {
        match value {
            None => Ok(Self::default()),
            Some(name) => OutputFormat::from_str(name, true)
                .map_err(|_| anyhow!("Unknown output format in config: {}", name)),
        }
    }
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Horizontal bar for a 0-100 value
pub fn format_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Shorten `text` to at most `max` characters
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Color a utilization percentage
pub fn color_usage(percent: f64) -> String {
    let formatted = format_percent(percent);
    if percent >= 80.0 {
        formatted.red().to_string()
    } else if percent >= 60.0 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}

pub fn color_connection(state: ConnectionState) -> String {
    match state {
        ConnectionState::Live => "live".green().bold().to_string(),
        ConnectionState::Degraded => "degraded".yellow().bold().to_string(),
        ConnectionState::Unreachable => "unreachable".red().bold().to_string(),
        ConnectionState::Loading => "loading".blue().to_string(),
    }
}

pub fn color_incident_severity(severity: IncidentSeverity) -> String {
    let label = severity.as_str();
    match severity {
        IncidentSeverity::Success => label.green().to_string(),
        IncidentSeverity::Warning => label.yellow().to_string(),
        IncidentSeverity::Error => label.red().to_string(),
        IncidentSeverity::Info => label.blue().to_string(),
    }
}

pub fn color_recommendation_severity(severity: RecommendationSeverity) -> String {
    let label = severity.as_str();
    match severity {
        RecommendationSeverity::High => label.red().bold().to_string(),
        RecommendationSeverity::Medium => label.yellow().to_string(),
        RecommendationSeverity::Low => label.dimmed().to_string(),
    }
}

/// Color a backend status word
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "connected" | "running" => status.green().to_string(),
        "degraded" | "warning" => status.yellow().to_string(),
        "unhealthy" | "disconnected" | "error" | "failed" => status.red().to_string(),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_percent(42.25), "42.2%");
        assert_eq!(format_currency(12.5), "$12.50");
        assert_eq!(format_bar(50.0, 10), "█████░░░░░");
        assert_eq!(format_bar(140.0, 4), "████");
        assert_eq!(format_bar(-3.0, 4), "░░░░");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("CPU Overload Detected", 10), "CPU Ove...");
    }

    #[test]
    fn test_format_from_config() {
        assert_eq!(OutputFormat::from_config(None).unwrap(), OutputFormat::Table);
        assert_eq!(
            OutputFormat::from_config(Some("JSON")).unwrap(),
            OutputFormat::Json
        );
        assert!(OutputFormat::from_config(Some("yaml")).is_err());
    }

    #[test]
    fn test_colored_labels_keep_text() {
        assert!(color_connection(ConnectionState::Degraded).contains("degraded"));
        assert!(color_incident_severity(IncidentSeverity::Error).contains("error"));
        assert!(color_recommendation_severity(RecommendationSeverity::High).contains("high"));
        assert!(color_usage(91.0).contains("91.0%"));
    }
}
