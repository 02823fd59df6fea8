//! SentinelOps CLI
//!
//! A command-line front-end over the live telemetry sync: cluster status,
//! incidents, recommendations, the rolling chart and chaos-test triggers.

mod client;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use commands::{chaos, chart, health, incidents, recommendations, status};
use sentinel_lib::chaos::{DEFAULT_SPIKE_DURATION, DEFAULT_TARGET};
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// SentinelOps CLI
#[derive(Parser)]
#[command(name = "sentinel")]
#[command(author, version, about = "CLI for the SentinelOps live cluster view", long_about = None)]
pub struct Cli {
    /// Backend URL (can also be set via SENTINEL_API_URL or the config file)
    #[arg(long, env = "SENTINEL_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format (defaults to the config file's, then table)
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Aggregation window of the full snapshot in hours
    #[arg(long, default_value_t = 24, global = true)]
    pub hours: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout: u64,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the reconciled cluster status
    Status,

    /// Keep polling and redraw the status until Ctrl-C
    Watch {
        /// Redraw period in seconds
        #[arg(long, default_value_t = 2)]
        refresh: u64,
    },

    /// List recent incidents
    Incidents {
        /// Show at most this many incidents
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// List cost recommendations
    Recommendations,

    /// Show the rolling one-hour chart
    Chart,

    /// Check backend health
    Health,

    /// Chaos-test triggers
    #[command(subcommand)]
    Chaos(ChaosCommands),

    /// Manage the CLI config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ChaosCommands {
    /// Start a cpu stress run
    CpuSpike {
        /// Target deployment
        #[arg(long, default_value = DEFAULT_TARGET)]
        target: String,

        /// Stress duration in seconds
        #[arg(long, default_value_t = DEFAULT_SPIKE_DURATION.as_secs())]
        duration: u64,
    },

    /// Delete one random pod of a deployment
    Crash {
        /// Target deployment
        #[arg(long, default_value = DEFAULT_TARGET)]
        target: String,
    },

    /// Delete half of the pods of a deployment at once
    Cascade {
        /// Target deployment
        #[arg(long, default_value = DEFAULT_TARGET)]
        target: String,
    },

    /// Remove leftover stress pods
    Cleanup,

    /// Show active simulations and recent events
    Status,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the config file location and contents
    Show,

    /// Store defaults in the config file
    Set {
        /// Backend URL to use when no flag or env var is given
        #[arg(long)]
        url: Option<String>,

        /// Default output format
        #[arg(long)]
        default_format: Option<output::OutputFormat>,
    },
}

fn init_logging(verbose: bool) {
    if !verbose {
        return;
    }
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("warn,sentinel_lib=debug,sentinel=debug")
        }))
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;

    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let timeout = Duration::from_secs(cli.timeout);
    let connect = || client::Backend::new(&api_url, cli.hours, timeout);
    let format = || match cli.format {
        Some(format) => Ok(format),
        None => output::OutputFormat::from_config(config.default_format.as_deref()),
    };

    match cli.command {
        Commands::Status => status::show_status(&connect()?, format()?).await?,
        Commands::Watch { refresh } => {
            status::watch(&connect()?, Duration::from_secs(refresh.max(1)), format()?).await?
        }
        Commands::Incidents { limit } => {
            incidents::list_incidents(&connect()?, limit, format()?).await?
        }
        Commands::Recommendations => {
            recommendations::list_recommendations(&connect()?, format()?).await?
        }
        Commands::Chart => chart::show_chart(&connect()?, format()?).await?,
        Commands::Health => health::check_health(&connect()?, format()?).await?,
        Commands::Chaos(chaos_cmd) => {
            let (backend, format) = (connect()?, format()?);
            match chaos_cmd {
                ChaosCommands::CpuSpike { target, duration } => {
                    chaos::cpu_spike(&backend, &target, Duration::from_secs(duration), format)
                        .await?
                }
                ChaosCommands::Crash { target } => chaos::crash(&backend, &target, format).await?,
                ChaosCommands::Cascade { target } => {
                    chaos::cascade(&backend, &target, format).await?
                }
                ChaosCommands::Cleanup => chaos::cleanup(&backend, format).await?,
                ChaosCommands::Status => chaos::status(&backend, format).await?,
            }
        }
        Commands::Config(command) => configure(config.clone(), command)?,
    }

    Ok(())
}

fn configure(mut config: config::Config, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("{}", config::Config::config_path()?.display());
            output::print_json(&config)?;
        }
        ConfigCommands::Set {
            url,
            default_format,
        } => {
            if let Some(url) = url {
                url::Url::parse(&url).with_context(|| format!("Invalid API URL: {}", url))?;
                config.api_url = Some(url);
            }
            if let Some(format) = default_format {
                config.default_format = format
                    .to_possible_value()
                    .map(|value| value.get_name().to_string());
            }
            let path = config.save()?;
            output::print_success(&format!("Saved {}", path.display()));
        }
    }

    Ok(())
}
