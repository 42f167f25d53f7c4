use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Classification of errors for retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryableError {
    /// 429 Rate Limit - retry with the rate limit schedule
    RateLimit,
    /// Other errors - don't retry
    Other,
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including initial attempt)
    pub max_attempts: u32,
    /// Delays for rate limit errors (milliseconds)
    pub rate_limit_delays_ms: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::rate_limit_only(vec![1000, 2000, 4000])
    }
}

impl RetryConfig {
    /// Retry only HTTP 429, once per configured delay
    pub fn rate_limit_only(delays_ms: Vec<u64>) -> Self {
        Self {
            max_attempts: delays_ms.len() as u32,
            rate_limit_delays_ms: delays_ms,
        }
    }

    /// Get the delay for a specific retry attempt and error type
    fn get_delay(&self, attempt: u32, error_type: RetryableError) -> Option<Duration> {
        let delays = match error_type {
            RetryableError::RateLimit => &self.rate_limit_delays_ms,
            RetryableError::Other => return None,
        };

        delays
            .get(attempt as usize)
            .map(|&delay_ms| Duration::from_millis(delay_ms))
    }
}

/// Retry an async operation, sleeping between attempts according to the
/// class `classify_error` assigns to each failure.
///
/// Returns the last error once the schedule for its class is exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    config: &RetryConfig,
    classify_error: impl Fn(&E) -> RetryableError,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("✅ Operation succeeded after {} retry attempts", attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                let error_type = classify_error(&e);

                if error_type == RetryableError::Other {
                    debug!("Operation failed with non-retryable error: {}", e);
                    return Err(e);
                }

                if attempt >= config.max_attempts {
                    error!(
                        "❌ Operation failed after {} attempts (max retries exhausted): {}",
                        attempt + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = match config.get_delay(attempt, error_type) {
                    Some(d) => d,
                    None => {
                        error!("❌ No delay configured for attempt {} ({:?}), failing", attempt, error_type);
                        return Err(e);
                    }
                };

                warn!(
                    "⚠️  Operation failed (attempt {}/{}): {} - Retrying in {}ms (error type: {:?})",
                    attempt + 1,
                    config.max_attempts + 1,
                    e,
                    delay.as_millis(),
                    error_type
                );

                tokio::time::sleep(delay).await;

                attempt += 1;
            }
        }
    }
}
