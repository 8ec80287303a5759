//! Exponential backoff for throttled API calls

use crate::integration::config::RetrySettings;
use crate::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry
    pub base_delay_ms: u64,
    /// Upper bound for a single delay
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay_ms: settings.base_delay_ms,
            max_delay_ms: settings.max_delay_ms,
        }
    }
}

impl RetryConfig {
    /// Delay before retrying after failed attempt number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms))
    }
}

/// Run `operation`, retrying rate-limit and unavailable errors with backoff.
///
/// Any other error is returned immediately.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} attempts", operation_name, attempt + 1);
                }
                return Ok(value);
            }
            Err(error) if error.is_retryable() && attempt + 1 < config.max_attempts => {
                let delay = config.delay_for(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:.1}s",
                    operation_name,
                    attempt + 1,
                    config.max_attempts,
                    error,
                    delay.as_secs_f64()
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                if error.is_retryable() {
                    warn!("{} exhausted {} attempts", operation_name, config.max_attempts);
                }
                return Err(error);
            }
        }
    }
}
