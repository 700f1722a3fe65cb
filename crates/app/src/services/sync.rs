//! Ads platform sync client.
//!
//! Pushes aggregated shop metrics to the configured ingest endpoint.
//! Strictly best-effort: callers log a failed push and move on. The client
//! never retries; each report carries an idempotency key so the receiving
//! side can deduplicate redelivered reports on its own.

use std::sync::Arc;
use std::time::Duration;

use adstem_core::ShopDomain;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::SyncConfig;

/// Per-request timeout. The sender is on the hook for a fast response to
/// its own caller, so a slow ingest endpoint is treated as a failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the per-report idempotency key.
const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Errors that can occur when pushing to the ads platform.
#[derive(Debug, Error)]
pub enum SyncError {
    /// HTTP request failed (network, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ingest endpoint rejected the report.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client could not be constructed from the configuration.
    #[error("Invalid sync configuration: {0}")]
    Config(String),
}

/// One aggregated report for a shop.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Shop the metrics belong to.
    pub shop: ShopDomain,
    /// Connector the metrics are attributed to.
    pub connector_id: String,
    /// Aggregated metrics, shaped by the caller.
    pub metrics: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

/// Ads platform ingest client.
#[derive(Clone)]
pub struct SyncClient {
    inner: Arc<SyncClientInner>,
}

struct SyncClientInner {
    client: reqwest::Client,
    api_url: Url,
}

impl SyncClient {
    /// Create a new sync client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key contains characters invalid in an
    /// HTTP header or the HTTP client fails to build.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| SyncError::Config(format!("Invalid API key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(SyncClientInner {
                client,
                api_url: config.api_url.clone(),
            }),
        })
    }

    /// The configured ingest endpoint.
    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.inner.api_url
    }

    /// Push one report to the ingest endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error on any network failure, timeout, or non-2xx
    /// response. The caller decides whether that matters; this client does
    /// not retry.
    #[instrument(skip(self, report), fields(shop = %report.shop, connector_id = %report.connector_id))]
    pub async fn push_report(&self, report: &SyncReport) -> Result<(), SyncError> {
        let idempotency_key = Uuid::new_v4().to_string();

        let response = self
            .inner
            .client
            .post(self.inner.api_url.clone())
            .header(IDEMPOTENCY_KEY_HEADER, &idempotency_key)
            .json(report)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SyncError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(idempotency_key = %idempotency_key, "Report pushed to ads platform");

        Ok(())
    }
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("api_url", &self.inner.api_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn test_sync_config(api_key: &str) -> SyncConfig {
        SyncConfig {
            api_url: Url::parse("https://ingest.ads.example.net/v1/reports").unwrap(),
            api_key: SecretString::from(api_key),
        }
    }

    #[test]
    fn test_client_construction() {
        let client = SyncClient::new(&test_sync_config("sk_live_abc123")).unwrap();
        assert_eq!(
            client.api_url().as_str(),
            "https://ingest.ads.example.net/v1/reports"
        );
    }

    #[test]
    fn test_client_rejects_unheaderable_key() {
        let err = SyncClient::new(&test_sync_config("bad\nkey")).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let client = SyncClient::new(&test_sync_config("sk_live_abc123")).unwrap();
        let output = format!("{client:?}");

        assert!(output.contains("ingest.ads.example.net"));
        assert!(!output.contains("sk_live_abc123"));
    }

    #[test]
    fn test_report_serialization() {
        let report = SyncReport {
            shop: ShopDomain::parse("example.myshopify.com").unwrap(),
            connector_id: "conn-42".to_owned(),
            metrics: serde_json::json!({ "sessions": 3, "online_sessions": 1 }),
            generated_at: Utc::now(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["shop"], "example.myshopify.com");
        assert_eq!(json["connector_id"], "conn-42");
        assert_eq!(json["metrics"]["sessions"], 3);
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::Api {
            status: 503,
            message: "ingest unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - ingest unavailable");
    }
}
