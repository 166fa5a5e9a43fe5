// Retry with exponential backoff for remote search calls
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// How hard we try before giving up on Ticketmaster
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// No retries at all - the first failure is final
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), capped at `max_delay_ms`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay = (self.initial_delay_ms as f64) * self.backoff_multiplier.powi(exponent);
        Duration::from_millis((delay as u64).min(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects the error, or
/// we run out of attempts. The last error is returned as-is.
pub async fn with_retry<F, Fut, T, E, R>(
    config: &RetryConfig,
    should_retry: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("Search request succeeded after {} retries", attempt);
                }
                return Ok(result);
            }
            Err(err) => {
                attempt += 1;

                if !should_retry(&err) {
                    debug!("Not retrying: {}", err);
                    return Err(err);
                }

                if attempt > config.max_retries {
                    warn!("Search request failed after {} attempts: {}", attempt, err);
                    return Err(err);
                }

                let delay = config.delay_for(attempt);
                warn!(
                    "Search request failed (attempt {}/{}): {}. Retrying in {}ms",
                    attempt,
                    config.max_retries + 1,
                    err,
                    delay.as_millis()
                );
                sleep(delay).await;
            }
        }
    }
}

/// 5xx, 429 and 408 are worth another go. Everything else isn't.
pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error()
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(1), Duration::from_millis(500));
        assert_eq!(config.delay_for(2), Duration::from_millis(1000));
        assert_eq!(config.delay_for(3), Duration::from_millis(2000));
        assert_eq!(config.delay_for(10), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);

        let result = with_retry(&fast(), |_| true, || async {
            let count = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if count < 3 {
                Err("temporary failure")
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result = with_retry(&fast(), |_| true, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<i32, _>("down")
        })
        .await;

        assert_eq!(result, Err("down"));
        assert_eq!(calls.load(Ordering::SeqCst), 4); // first try + 3 retries
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let calls = AtomicU32::new(0);

        let result = with_retry(&fast(), |e: &&'static str| *e != "unauthorized", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<i32, _>("unauthorized")
        })
        .await;

        assert_eq!(result, Err("unauthorized"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retryable_status_codes() {
        assert!(is_retryable_status(reqwest::StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(reqwest::StatusCode::REQUEST_TIMEOUT));
        assert!(!is_retryable_status(reqwest::StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(reqwest::StatusCode::NOT_FOUND));
    }
}
