//! REST backend for the claims API.
//!
//! Provides the `ClaimsBackend` trait and its reqwest implementation.
//! The controller stays generic over the trait, so its state rules can be
//! exercised against scripted responses without a running server.

use claimlens_model::{ChartPoint, ClaimRecord, IngestReport, MetricsSummary, Page, ScoringConfig};
use claimlens_query::ClaimsQuery;
use serde::de::DeserializeOwned;
use std::future::Future;
use thiserror::Error;

/// Errors from claims API operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("connection failed: {0}")]
    Connection(String),

    /// Non-2xx response, carrying the raw body text when available.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("backend not available")]
    Unavailable,
}

/// Trait for claims search backends.
///
/// The REST implementation below is the production backend; the seam exists
/// so pagination and stale-response rules can be tested in isolation.
pub trait ClaimsBackend {
    /// Fetch one page of claims matching the query.
    fn search(
        &self,
        query: &ClaimsQuery,
    ) -> impl Future<Output = Result<Page<ClaimRecord>, BackendError>> + Send;

    /// Check if the backend is reachable.
    fn health_check(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Get the backend name for logging.
    fn name(&self) -> &'static str;
}

/// Claims REST API configuration.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL of the claims API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Claims REST API backend.
pub struct RestBackend {
    config: RestConfig,
    client: reqwest::Client,
}

impl RestBackend {
    /// Create a new REST backend.
    pub fn new(config: RestConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .get(self.endpoint(path))
            .query(params)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    /// Dashboard headline metrics.
    pub async fn metrics(&self) -> Result<MetricsSummary, BackendError> {
        self.get_json("/api/v1/metrics", &[]).await
    }

    /// Aggregated chart data, optionally bounded by encounter date.
    pub async fn chart_data(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<ChartPoint>, BackendError> {
        let mut params = Vec::new();
        if let Some(start) = start_date {
            params.push(("startDate".to_string(), start.to_string()));
        }
        if let Some(end) = end_date {
            params.push(("endDate".to_string(), end.to_string()));
        }
        self.get_json("/api/v1/metrics/chart-data", &params).await
    }

    /// Current fraud-scoring weights.
    pub async fn scoring_config(&self) -> Result<ScoringConfig, BackendError> {
        self.get_json("/api/v1/admin/scoring-config", &[]).await
    }

    /// Replace the fraud-scoring weights. The server answers with no body.
    pub async fn update_scoring_config(&self, config: &ScoringConfig) -> Result<(), BackendError> {
        let response = self
            .client
            .put(self.endpoint("/api/v1/admin/scoring-config"))
            .json(config)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        Ok(())
    }

    /// Upload a claims CSV for ingestion.
    pub async fn ingest_csv(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestReport, BackendError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("/api/v1/admin/ingest"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        Self::decode(response).await
    }
}

impl ClaimsBackend for RestBackend {
    async fn search(&self, query: &ClaimsQuery) -> Result<Page<ClaimRecord>, BackendError> {
        tracing::debug!(query = %query.query_string(), "Fetching claims page");

        self.get_json("/api/v1/claims", &query.params()).await
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(self.endpoint("/api/v1/metrics"))
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable)
        }
    }

    fn name(&self) -> &'static str {
        "claims-rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let backend = RestBackend::new(RestConfig::default());
        assert_eq!(
            backend.endpoint("/api/v1/claims"),
            "http://127.0.0.1:8080/api/v1/claims"
        );
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let backend = RestBackend::new(RestConfig {
            base_url: "http://claims.internal/".to_string(),
            ..Default::default()
        });
        assert_eq!(
            backend.endpoint("/api/v1/metrics"),
            "http://claims.internal/api/v1/metrics"
        );
    }

    #[test]
    fn test_status_error_keeps_body_text() {
        let err = BackendError::Status {
            status: 502,
            body: "upstream timeout".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: upstream timeout");
    }
}
