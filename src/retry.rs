//! Generic retry mechanism for async operations.
//!
//! Every outbound API call goes through [`retry`], which performs a bounded
//! number of attempts with exponential backoff. Two profiles exist: the
//! block-indexing API is rate limited and gets a courtesy delay before every
//! attempt (including the first); the coordination API only waits between
//! failed attempts.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::consts::{
    QUEUE_MAX_ATTEMPTS, RETRY_BASE_DELAY_SECS, RETRY_MAX_DELAY_SECS, SCAN_MAX_ATTEMPTS,
};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts.
    pub max_attempts: u32,
    /// Initial delay between attempts.
    pub delay: Duration,
    /// Multiplier for exponential backoff. 1.0 = fixed delay, 2.0 = double each time.
    pub backoff_multiplier: f64,
    /// Maximum delay cap for exponential backoff.
    pub max_delay: Duration,
    /// When set, the delay runs *before* every attempt instead of only after
    /// failures. Used for rate-limited endpoints.
    pub courtesy_delay: bool,
}

impl RetryConfig {
    /// Profile for block-indexing API calls: 5 attempts, courtesy delay
    /// before each one, doubling from 1s.
    pub fn scanning() -> Self {
        Self {
            max_attempts: SCAN_MAX_ATTEMPTS,
            delay: Duration::from_secs(RETRY_BASE_DELAY_SECS),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(RETRY_MAX_DELAY_SECS),
            courtesy_delay: true,
        }
    }

    /// Profile for coordination API calls: 4 attempts, backoff only between
    /// failures, doubling from 1s.
    pub fn queue() -> Self {
        Self {
            max_attempts: QUEUE_MAX_ATTEMPTS,
            delay: Duration::from_secs(RETRY_BASE_DELAY_SECS),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(RETRY_MAX_DELAY_SECS),
            courtesy_delay: false,
        }
    }

    /// Calculate delay for a given attempt number (1-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.backoff_multiplier <= 1.0 {
            return self.delay;
        }

        let multiplier = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1) as i32);
        let delay_millis = (self.delay.as_millis() as f64 * multiplier) as u64;
        let delay = Duration::from_millis(delay_millis);

        std::cmp::min(delay, self.max_delay)
    }
}

/// Retry an async operation until it succeeds or max attempts are exhausted.
///
/// All errors are considered retryable. Exhaustion returns the last error;
/// callers convert it into an explicit "unavailable" outcome rather than
/// letting it escape a scheduler tick.
pub async fn retry<F, Fut, T, E>(
    config: RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1u32;

    loop {
        if config.courtesy_delay {
            tokio::time::sleep(config.delay_for_attempt(attempt)).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= config.max_attempts {
                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        max_attempts = config.max_attempts,
                        error = %e,
                        "Max retry attempts exhausted"
                    );
                    return Err(e);
                }

                let delay = config.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "Operation failed, retrying"
                );

                if !config.courtesy_delay {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}
