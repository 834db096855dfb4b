//! Reachability probe for the knowledge-base host.
//!
//! Neither runtime exposes a dedicated health route, so the probe issues a
//! `GET {host}` and treats any non-5xx answer as "reachable".
//! [`HealthService::check`] is resilient and never fails (errors mapped to `ok=false`).

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::qna_endpoint_config::QnaEndpointConfig;
use crate::error_handler::{HttpError, QnaServiceError, Result, make_snippet};

/// A serializable health snapshot for the scorer host.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Back end ("QnaMaker", "Language").
    pub service: String,
    /// Target host URL.
    pub endpoint: String,
    /// Knowledge base id or project name.
    pub knowledge_base: String,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &QnaEndpointConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            service: format!("{:?}", cfg.service_type),
            endpoint: cfg.base_url().to_string(),
            knowledge_base: cfg.knowledge_base_id.clone(),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker reusing a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`QnaServiceError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(5));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(
            default_timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Probes the host of `cfg`. Never returns an error.
    pub async fn check(&self, cfg: &QnaEndpointConfig) -> HealthStatus {
        let start = Instant::now();
        match self.try_probe(cfg).await {
            Ok(status) => {
                let latency = start.elapsed().as_millis();
                info!(endpoint = %cfg.base_url(), %status, latency_ms = latency, "health probe completed");
                HealthStatus::new(cfg, true, latency, format!("host reachable (HTTP {status})"))
            }
            Err(err) => {
                let latency = start.elapsed().as_millis();
                warn!(endpoint = %cfg.base_url(), error = %err, latency_ms = latency, "health probe failed");
                HealthStatus::new(cfg, false, latency, err.to_string())
            }
        }
    }

    /// Strict probe. Fails on transport errors and 5xx statuses.
    async fn try_probe(&self, cfg: &QnaEndpointConfig) -> Result<StatusCode> {
        let url = cfg.base_url().to_string();
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        debug!(service = ?cfg.service_type, "GET {}", url);
        let resp = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QnaServiceError::Timeout(timeout)
                } else {
                    QnaServiceError::HttpTransport(e)
                }
            })?;

        let status = resp.status();
        if status.is_server_error() {
            let text = resp.text().await.unwrap_or_default();
            return Err(QnaServiceError::HttpStatus(HttpError {
                status,
                url,
                snippet: make_snippet(&text),
            }));
        }
        Ok(status)
    }
}
