use crate::api::retry::{with_retry, RetryConfig};
use crate::{Result, YukkiError};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Longest error body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// JSON-over-HTTPS client for the hosted generative API.
///
/// Authenticates with the `key` query parameter and retries throttled calls.
#[derive(Clone)]
pub struct GeminiHttp {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl std::fmt::Debug for GeminiHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the key
        f.debug_struct("GeminiHttp")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

impl GeminiHttp {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(YukkiError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| YukkiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            retry,
        })
    }

    /// URL of a model's `generateContent` method
    pub fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// POST `body` to `url` and parse the JSON reply, with retries
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        operation_name: &str,
    ) -> Result<Value> {
        with_retry(&self.retry, operation_name, || self.post_once(url, body)).await
    }

    async fn post_once<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let bytes = response.bytes().await?;
        debug!("{} -> {} ({} bytes)", url, status, bytes.len());

        serde_json::from_slice(&bytes)
            .map_err(|e| YukkiError::InvalidResponse(format!("Malformed JSON: {}", e)))
    }
}

/// Map a failed HTTP status to an error
pub fn status_error(status: StatusCode, body: &str) -> YukkiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => YukkiError::RateLimited,
        StatusCode::SERVICE_UNAVAILABLE => YukkiError::Unavailable,
        _ => YukkiError::Http {
            status: status.as_u16(),
            message: error_summary(body),
        },
    }
}

/// Pull `error.message` from an API error body, falling back to the raw text
fn error_summary(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    match message.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message,
    }
}
