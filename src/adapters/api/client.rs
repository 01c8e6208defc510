//! Merchant API HTTP Client — Authenticated REST Client With Retries
//!
//! Wraps reqwest with bearer authentication, bounded retries with
//! exponential backoff, and the mapping from HTTP outcomes to the
//! engine's `GatewayError` taxonomy. Transition endpoints and the order
//! collection share this one client.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::auth::SessionAuth;
use crate::ports::gateway::GatewayError;

/// Configuration for the merchant API client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the merchant backend.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient errors.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub retry_base_delay: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://merchant-api.example.com".to_string(),
            timeout: Duration::from_secs(15),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(200),
        }
    }
}

/// Bearer-authenticated HTTP client for the merchant backend.
pub struct ApiClient {
    http: Client,
    auth: Arc<SessionAuth>,
    config: ApiClientConfig,
}

impl ApiClient {
    pub fn new(auth: Arc<SessionAuth>, config: ApiClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, auth, config })
    }

    pub fn auth(&self) -> &SessionAuth {
        &self.auth
    }

    /// GET with auth and retry.
    pub async fn get(&self, path: &str) -> Result<Response, GatewayError> {
        let url = format!("{}{}", self.config.base_url, path);
        self.execute_with_retry(self.http.get(&url), path).await
    }

    /// POST a JSON body with auth and retry.
    ///
    /// Transitions are idempotent-on-retry on the backend side (keyed by
    /// order id), so retrying a timed-out POST is safe.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Response, GatewayError> {
        let url = format!("{}{}", self.config.base_url, path);
        let request = self.http.post(&url).json(body);
        self.execute_with_retry(request, path).await
    }

    /// Execute with bearer auth and bounded exponential-backoff retries.
    ///
    /// Retryable: transport errors, 429, 5xx. Not retryable: 401/403
    /// (session expired — also invalidates the stored token) and other
    /// 4xx (validation/conflict, body surfaced verbatim).
    async fn execute_with_retry(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<Response, GatewayError> {
        let Some(bearer) = self.auth.bearer() else {
            return Err(GatewayError::SessionExpired);
        };

        let mut last_error: Option<GatewayError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis(), path, "Retrying request");
                sleep(delay).await;
            }

            let req = request
                .try_clone()
                .ok_or_else(|| {
                    GatewayError::Transport("request body not cloneable".to_string())
                })?
                .bearer_auth(&bearer);

            match req.send().await {
                Ok(response) => match response.status() {
                    status if status.is_success() => return Ok(response),
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        warn!(path, "Session rejected by backend");
                        self.auth.invalidate();
                        return Err(GatewayError::SessionExpired);
                    }
                    StatusCode::TOO_MANY_REQUESTS => {
                        warn!(path, "Rate limited, backing off");
                        last_error =
                            Some(GatewayError::Transport("rate limited".to_string()));
                    }
                    status if status.is_server_error() => {
                        warn!(%status, path, "Server error, retrying");
                        last_error =
                            Some(GatewayError::Transport(format!("server error {status}")));
                    }
                    status => {
                        let body = response.text().await.unwrap_or_default();
                        let message = extract_error_message(&body)
                            .unwrap_or_else(|| format!("request failed with {status}"));
                        return Err(GatewayError::Rejected { message });
                    }
                },
                Err(e) => {
                    warn!(error = %e, attempt, path, "Request failed");
                    last_error = Some(GatewayError::Transport(e.to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GatewayError::Transport("max retries exceeded".to_string())))
    }
}

/// Pull the backend's human message out of an error body, if present.
///
/// The backend is inconsistent: sometimes `{"message": ...}`, sometimes
/// `{"error": ...}`, sometimes plain text.
fn extract_error_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return Some(text.to_string());
            }
        }
    }
    Some(body.trim().to_string())
}
