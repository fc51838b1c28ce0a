//! Exponential backoff around extraction.
//!
//! The extractor itself never retries; callers that want retries wrap it here.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::ExtractionError;
use crate::event::EventRecord;
use crate::extract::EventExtractor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1` (zero-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Run `extractor` until it succeeds, fails permanently, or runs out of attempts.
///
/// Only [`ExtractionError::is_retryable`] errors are retried; schema and
/// parse failures surface immediately.
pub async fn extract_with_retry(
    extractor: &EventExtractor,
    text: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<EventRecord, ExtractionError> {
    let mut attempt = 0;
    loop {
        match extractor.extract(text, cancel).await {
            Ok(record) => return Ok(record),
            Err(e) if e.is_retryable() && attempt + 1 < policy.max_attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis(),
                    "extraction failed, retrying: {}",
                    e
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ExtractionError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
