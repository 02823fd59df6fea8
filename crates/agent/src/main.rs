//! SentinelOps agent
//!
//! Keeps a live, reconciled view of the cluster by polling the SentinelOps
//! backend and serves it with health and metrics endpoints.

use anyhow::{Context, Result};
use sentinel_agent::{api, config::AgentConfig};
use sentinel_lib::sync::TelemetrySync;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = AGENT_VERSION, "Starting sentinel-agent");

    let config = AgentConfig::load()?;
    info!(
        api_url = %config.api_url,
        listen_port = config.listen_port,
        "Agent configured"
    );

    let sync = Arc::new(
        TelemetrySync::connect(config.sync_config()?).context("Failed to set up telemetry sync")?,
    );
    sync.start().await;

    let state = Arc::new(api::AppState::new(sync.clone()));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(api::serve(config.listen_port, state, async move {
        let _ = stop_rx.await;
    }));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("SIGINT received, shutting down");
        }
        result = &mut server => {
            sync.stop().await;
            return result.context("API server task panicked")?;
        }
    }

    sync.stop().await;
    let _ = stop_tx.send(());
    match server.await {
        Ok(Err(e)) => error!(error = %e, "API server failed"),
        Err(e) => error!(error = %e, "API server task panicked"),
        Ok(Ok(())) => {}
    }

    Ok(())
}
