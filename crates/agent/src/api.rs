//! HTTP API for health checks, Prometheus metrics and the dashboard view

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use sentinel_lib::{
    health::{ComponentStatus, HealthRegistry},
    sync::TelemetrySync,
};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<TelemetrySync>,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(sync: Arc<TelemetrySync>) -> Self {
        Self {
            health_registry: sync.health(),
            sync,
        }
    }
}

/// Health check response - returns 200 if operational, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 once the first full snapshot landed
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Full dashboard view
async fn view(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.sync.view().await)
}

#[derive(Debug, Deserialize)]
struct IncidentQuery {
    limit: Option<usize>,
}

async fn incidents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncidentQuery>,
) -> impl IntoResponse {
    let mut incidents = state.sync.view().await.incidents;
    if let Some(limit) = query.limit {
        incidents.truncate(limit);
    }
    Json(incidents)
}

async fn recommendations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.sync.view().await.recommendations)
}

async fn chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.sync.view().await.chart)
}

/// Poll both snapshots now and answer with the resulting view
async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let outcome = state.sync.refresh_now().await;
    info!(full = ?outcome.full, summary = ?outcome.summary, "Manual refresh");
    Json(state.sync.view().await)
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/view", get(view))
        .route("/api/v1/incidents", get(incidents))
        .route("/api/v1/recommendations", get(recommendations))
        .route("/api/v1/chart", get(chart))
        .route("/api/v1/refresh", post(refresh))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn serve<F>(port: u16, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
