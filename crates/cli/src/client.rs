//! Backend clients built from the global flags

use anyhow::{bail, Context, Result};
use sentinel_lib::{
    sync::{SyncConfig, SyncConfigBuilder, TelemetrySync},
    ChaosClient, DashboardView, HttpTransport, StructuredLogger, Transport,
};
use std::sync::Arc;
use std::time::Duration;

/// Connection settings shared by every command
pub struct Backend {
    config: SyncConfig,
}

impl Backend {
    pub fn new(api_url: &str, window_hours: u32, timeout: Duration) -> Result<Self> {
        let config = SyncConfigBuilder::new()
            .api_url(api_url)
            .window_hours(window_hours)
            .request_timeout(timeout)
            .build()?;

        Ok(Self { config })
    }

    pub fn api_url(&self) -> &str {
        &self.config.client.base_url
    }

    /// Sync core over HTTP; loops are not started
    pub fn telemetry(&self) -> Result<TelemetrySync> {
        TelemetrySync::connect(self.config.clone())
    }

    pub fn transport(&self) -> Result<Arc<dyn Transport>> {
        let transport = HttpTransport::new(self.config.client.clone())
            .context("Failed to create backend transport")?;
        Ok(Arc::new(transport))
    }

    pub fn chaos(&self) -> Result<ChaosClient> {
        Ok(ChaosClient::new(self.transport()?)
            .with_logger(StructuredLogger::new(self.api_url())))
    }

    /// Poll both snapshots once and build the view.
    ///
    /// Fails only when nothing was ever received; stale data is returned
    /// with its error attached.
    pub async fn load_view(&self) -> Result<DashboardView> {
        let sync = self.telemetry()?;
        sync.refresh_now().await;
        let view = sync.view().await;

        if view.merged.is_none() {
            if let Some(err) = &view.last_error {
                bail!("Backend at {} is unreachable: {}", self.api_url(), err);
            }
        }

        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_carries_flags() {
        let backend = Backend::new("http://backend:9000", 6, Duration::from_secs(2)).unwrap();
        assert_eq!(backend.api_url(), "http://backend:9000");
        assert_eq!(backend.config.window_hours, 6);
        assert_eq!(backend.config.client.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_flags_rejected() {
        assert!(Backend::new("not a url", 24, Duration::from_secs(10)).is_err());
        assert!(Backend::new("http://localhost:8000", 0, Duration::from_secs(10)).is_err());
        assert!(Backend::new("http://localhost:8000", 24, Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn test_load_view_from_backend() {
        let mut server = mockito::Server::new_async().await;
        let _full = server
            .mock("GET", "/dashboard/stats")
            .match_query(mockito::Matcher::UrlEncoded("hours".into(), "6".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"metrics": {"cpu_usage": 40.0, "memory_usage": 50.0}, "cluster": {"total_pods": 3, "healthy_pods": 3}}"#)
            .create_async()
            .await;
        let _summary = server
            .mock("GET", "/stats/summary")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"cpu": 55.5}"#)
            .create_async()
            .await;

        let backend = Backend::new(&server.url(), 6, Duration::from_secs(5)).unwrap();
        let view = backend.load_view().await.unwrap();

        let merged = view.merged.unwrap();
        assert_eq!(merged.cpu, 55.5);
        assert_eq!(merged.memory, 50.0);
        assert_eq!(merged.pods.total, 3);
        assert!(view.last_error.is_none());
    }

    #[tokio::test]
    async fn test_load_view_fails_without_data() {
        let mut server = mockito::Server::new_async().await;
        let _full = server
            .mock("GET", "/dashboard/stats")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let _summary = server
            .mock("GET", "/stats/summary")
            .with_status(500)
            .create_async()
            .await;

        let backend = Backend::new(&server.url(), 24, Duration::from_secs(5)).unwrap();
        let err = backend.load_view().await.unwrap_err();

        assert!(err.to_string().contains("unreachable"), "got {}", err);
    }
}
