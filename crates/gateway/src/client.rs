//! Remote data client for the single-endpoint backend.
//!
//! Reads are `GET ?action=...`, writes are `POST` with a `text/plain` JSON
//! body so the backend never sees a CORS preflight.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use tokio::time::sleep;

use foodrescue_core::config::{AppConfig, RetryPolicy};
use foodrescue_core::remote::{DataGatewayTrait, Envelope, CONNECTION_FAILED_MESSAGE};

use crate::error::{GatewayError, Result, RetryClass};

const MAX_LOG_BODY_CHARS: usize = 512;
const PLAIN_TEXT_UTF8: &str = "text/plain;charset=utf-8";

#[derive(Debug, Clone)]
pub struct RemoteDataClient {
    client: reqwest::Client,
    api_url: String,
    retry: RetryPolicy,
}

impl RemoteDataClient {
    fn log_response(action: &str, status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[Gateway] {} response status: {}", action, status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[Gateway] {} response error ({}): {}", action, status, preview);
    }

    /// Create a client for the backend deployed at `api_url`.
    pub fn new(api_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let api_url = api_url.trim().trim_end_matches('/');
        if api_url.is_empty() {
            return Err(GatewayError::invalid_request("Backend URL is empty"));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            retry,
        })
    }

    pub fn from_config(config: &AppConfig) -> foodrescue_core::Result<Self> {
        let api_url = config.api_url()?;
        Self::new(api_url, config.http_timeout, config.retry)
            .map_err(|err| foodrescue_core::Error::Config(err.to_string()))
    }

    async fn parse_response(action: &str, response: reqwest::Response) -> Result<Envelope> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(action, status, &body);

        if !status.is_success() {
            return Err(GatewayError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends the request built by `build`, retrying transport failures
    /// according to the retry policy.
    async fn execute<F>(&self, action: &str, build: F) -> Result<Envelope>
    where
        F: Fn() -> reqwest::RequestBuilder + Send + Sync,
    {
        let attempts = self.retry.total_attempts();
        let mut attempt = 0u32;

        loop {
            attempt = attempt.saturating_add(1);
            let result = match build().send().await {
                Ok(response) => Self::parse_response(action, response).await,
                Err(err) => Err(GatewayError::Http(err)),
            };

            match result {
                Err(err) if err.retry_class() == RetryClass::Retryable && attempt < attempts => {
                    debug!(
                        "[Gateway] Retry attempt {}/{} for {} after transport error: {}",
                        attempt + 1,
                        attempts,
                        action,
                        err
                    );
                    sleep(self.retry.delay).await;
                }
                other => return other,
            }
        }
    }

    async fn get(&self, action: &str, params: &[(&str, String)]) -> Result<Envelope> {
        let mut query: Vec<(&str, String)> = Vec::with_capacity(params.len() + 2);
        query.push(("action", action.to_string()));
        query.extend(params.iter().cloned());
        query.push(("_", chrono::Utc::now().timestamp_millis().to_string()));

        debug!("[Gateway] GET {}", action);
        self.execute(action, || self.client.get(&self.api_url).query(&query))
            .await
    }

    async fn post(&self, action: &str, payload: &Value) -> Result<Envelope> {
        let body = serde_json::to_string(&json!({ "action": action, "payload": payload }))?;

        debug!("[Gateway] POST {}", action);
        self.execute(action, || {
            self.client
                .post(&self.api_url)
                .header(CONTENT_TYPE, HeaderValue::from_static(PLAIN_TEXT_UTF8))
                .body(body.clone())
        })
        .await
    }
}

#[async_trait]
impl DataGatewayTrait for RemoteDataClient {
    async fn fetch(&self, action: &str, params: &[(&str, String)]) -> Envelope {
        match self.get(action, params).await {
            Ok(envelope) => envelope,
            Err(err) => {
                error!("[Gateway] Fetch {} failed: {}", action, err);
                Envelope::failure(CONNECTION_FAILED_MESSAGE)
            }
        }
    }

    async fn send(&self, action: &str, payload: &Value) -> Envelope {
        match self.post(action, payload).await {
            Ok(envelope) => envelope,
            Err(err) => {
                error!("[Gateway] Send {} failed: {}", action, err);
                Envelope::failure(CONNECTION_FAILED_MESSAGE)
            }
        }
    }
}
