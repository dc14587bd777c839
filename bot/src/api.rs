//! Client for the homework status endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use common::config::BotConfig;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;
use std::error::Error as _;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Malformed, PollError};

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Anything that can answer "what changed since `from_date`".
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, from_date: u64) -> Result<Value, PollError>;
}

/// Capped exponential backoff for transport failures within one fetch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based):
    /// `min(base × 2^attempt, max)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

pub struct PracticumClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    retry: RetryPolicy,
}

impl PracticumClient {
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Self::new(
            &config.endpoint,
            &config.practicum_token,
            config.request_timeout(),
        )
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(&self, from_date: u64) -> Result<Value, PollError> {
        info!(endpoint = %self.endpoint, from_date, "Requesting homework statuses");

        let resp = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            warn!(status = status.as_u16(), body = %body, "API returned non-200 response");
            return Err(PollError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&text).map_err(|e| {
            Malformed::InvalidJson {
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> PollError {
        let err = err.without_url();
        let mut reason = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = cause.source();
        }
        PollError::Transport {
            endpoint: self.endpoint.clone(),
            reason,
        }
    }
}

#[async_trait]
impl StatusSource for PracticumClient {
    async fn fetch(&self, from_date: u64) -> Result<Value, PollError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(from_date).await {
                Err(e) if e.is_retryable() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/statuses/", addr)
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    async fn echo(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let from_date: u64 = params
            .get("from_date")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        Json(json!({
            "homeworks": [],
            "current_date": from_date + 50,
            "auth": auth,
        }))
    }

    #[test]
    fn test_backoff_is_capped() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.delay(0), Duration::from_secs(2));
        assert_eq!(retry.delay(1), Duration::from_secs(4));
        assert_eq!(retry.delay(3), Duration::from_secs(16));
        assert_eq!(retry.delay(4), Duration::from_secs(30));
        assert_eq!(retry.delay(40), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_sends_oauth_header_and_watermark() {
        let url = spawn_server(Router::new().route("/statuses/", get(echo))).await;
        let client = PracticumClient::new(&url, "test-token", Duration::from_secs(5)).unwrap();

        let body = client.fetch(1000).await.unwrap();
        assert_eq!(body["auth"], "OAuth test-token");
        assert_eq!(body["current_date"], 1050);
    }

    #[tokio::test]
    async fn test_non_200_is_http_status_error() {
        let app = Router::new().route(
            "/statuses/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let url = spawn_server(app).await;
        let client = PracticumClient::new(&url, "t", Duration::from_secs(5))
            .unwrap()
            .with_retry(fast_retry(3));

        let err = client.fetch(0).await.unwrap_err();
        assert_eq!(
            err,
            PollError::HttpStatus {
                status: 500,
                reason: "Internal Server Error".into(),
                body: "boom".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let app = Router::new().route("/statuses/", get(|| async { "<html>maintenance</html>" }));
        let url = spawn_server(app).await;
        let client = PracticumClient::new(&url, "t", Duration::from_secs(5)).unwrap();

        let err = client.fetch(0).await.unwrap_err();
        assert!(matches!(
            err,
            PollError::MalformedResponse(Malformed::InvalidJson { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_body_passes_through_fetch() {
        let app = Router::new().route("/statuses/", get(|| async { Json(json!([])) }));
        let url = spawn_server(app).await;
        let client = PracticumClient::new(&url, "t", Duration::from_secs(5)).unwrap();

        assert_eq!(client.fetch(0).await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/statuses/", addr);
        let client = PracticumClient::new(&url, "t", Duration::from_secs(5))
            .unwrap()
            .with_retry(fast_retry(2));

        match client.fetch(0).await.unwrap_err() {
            PollError::Transport { endpoint, reason } => {
                assert_eq!(endpoint, url);
                assert!(!reason.is_empty());
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_request_timeout_applies() {
        let app = Router::new().route(
            "/statuses/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"homeworks": []}))
            }),
        );
        let url = spawn_server(app).await;
        let client = PracticumClient::new(&url, "t", Duration::from_millis(100))
            .unwrap()
            .with_retry(fast_retry(1));

        let err = client.fetch(0).await.unwrap_err();
        assert!(err.is_retryable(), "timeout should surface as transport: {:?}", err);
    }
}
