use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use logscope_stream::StatsSource;
use logscope_types::{LogEvent, StatsSnapshot};

/// Errors from the log service endpoints
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Wire shape of the bulk fetch response
#[derive(Deserialize)]
struct LogsResponse {
    logs: Vec<LogEvent>,
}

/// HTTP client for the log service's pull endpoints
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Create a client for the given base URL, e.g. `http://localhost:4000`
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base)?;
        // A path without a trailing slash would swallow its last segment
        // on join.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    /// Base URL of the service
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Bulk fetch of recent history, newest-first, bounded server-side
    pub async fn fetch_logs(&self) -> Result<Vec<LogEvent>, ApiError> {
        let url = self.base.join("logs")?;
        let body: LogsResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.logs)
    }

    /// Aggregate fetch over a trailing window of `window_seconds`
    pub async fn fetch_stats(&self, window_seconds: u64) -> Result<StatsSnapshot, ApiError> {
        let mut url = self.base.join("logs/stats")?;
        url.query_pairs_mut()
            .append_pair("seconds", &window_seconds.to_string());

        let stats = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(stats)
    }
}

#[async_trait]
impl StatsSource for ApiClient {
    async fn fetch_stats(&self, window_seconds: u64) -> anyhow::Result<StatsSnapshot> {
        Ok(ApiClient::fetch_stats(self, window_seconds).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_response_decode() {
        let json = r#"{
            "logs": [
                { "id": 2, "timestamp": "2024-05-01T12:00:01Z", "level": "WARN",
                  "service": "payments", "message": "slow charge" },
                { "id": 1, "timestamp": "2024-05-01T12:00:00Z", "level": "INFO",
                  "service": "auth", "message": "ok" }
            ]
        }"#;
        let body: LogsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.logs.len(), 2);
        assert_eq!(body.logs[0].id, 2);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ApiClient::new("http://localhost:4000").unwrap();
        assert_eq!(client.base_url().path(), "/");

        let client = ApiClient::new("http://example.com/ingest").unwrap();
        assert_eq!(
            client.base_url().join("logs").unwrap().as_str(),
            "http://example.com/ingest/logs"
        );
    }

    #[test]
    fn test_rejects_garbage_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
