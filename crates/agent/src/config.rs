//! Agent configuration

use anyhow::{Context, Result};
use sentinel_lib::sync::{SyncConfig, SyncConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Config file read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "sentinel-agent.toml";

/// Agent configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// Port of the health/metrics/view server
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// SentinelOps backend base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Full snapshot polling period in seconds
    #[serde(default = "default_full_interval")]
    pub full_interval_secs: u64,

    /// Summary polling period in seconds
    #[serde(default = "default_summary_interval")]
    pub summary_interval_secs: u64,

    /// Aggregation window of the full snapshot in hours
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_listen_port() -> u16 {
    8080
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_full_interval() -> u64 {
    10
}

fn default_summary_interval() -> u64 {
    3
}

fn default_window_hours() -> u32 {
    24
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            api_url: default_api_url(),
            full_interval_secs: default_full_interval(),
            summary_interval_secs: default_summary_interval(),
            window_hours: default_window_hours(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl AgentConfig {
    /// Load from `sentinel-agent.toml` (optional) and `SENTINEL_*` variables
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load from `path` (optional) and `SENTINEL_*` variables; the
    /// environment wins over the file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("SENTINEL").try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        config
            .try_deserialize()
            .context("Invalid agent configuration")
    }

    /// Sync core settings derived from this configuration
    pub fn sync_config(&self) -> Result<SyncConfig> {
        SyncConfigBuilder::new()
            .api_url(self.api_url.clone())
            .full_interval(Duration::from_secs(self.full_interval_secs))
            .summary_interval(Duration::from_secs(self.summary_interval_secs))
            .window_hours(self.window_hours)
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
    }
}
