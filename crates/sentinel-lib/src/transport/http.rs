//! HTTP transport for the SentinelOps backend
//!
//! Wraps a `reqwest` client with a fixed per-call timeout. Dropping the
//! future returned by [`Transport::call`] aborts the request in flight.

use super::{Method, Operation, Params, Transport, TransportError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Timeout for a whole request, body included
    pub request_timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// HTTP implementation of [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a new transport with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = parse_base_url(&config.base_url)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Create a transport for `base_url` with default timeouts
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }

    fn endpoint(&self, operation: Operation) -> Result<Url, TransportError> {
        self.base_url
            .join(operation.path())
            .map_err(|e| TransportError::Unknown(format!("invalid endpoint: {}", e)))
    }
}

/// Parse the base URL, making sure relative joins append to its path
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("Invalid API URL: {}", raw))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_decode() || e.is_builder() {
            TransportError::Unknown(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::HttpStatus(status.as_u16())
        } else if e.is_connect() || e.is_request() || e.is_body() {
            TransportError::Network(e.to_string())
        } else {
            TransportError::Unknown(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        operation: Operation,
        params: &Params,
    ) -> Result<serde_json::Value, TransportError> {
        let url = self.endpoint(operation)?;

        let request = match operation.method() {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        let started = Instant::now();
        let response = request
            .query(params)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(
                operation = %operation,
                status = status.as_u16(),
                "Backend rejected request"
            );
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let body = response.json::<serde_json::Value>().await?;

        debug!(
            operation = %operation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request complete"
        );

        Ok(body)
    }
}
