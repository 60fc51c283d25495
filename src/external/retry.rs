use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::config::HttpClientConfig;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Runs `op` until it succeeds, fails permanently, or `max_retries` extra
/// attempts have been spent. Delays double from `retry_base_delay` and carry
/// up to 20% jitter.
pub async fn with_retry<T, E, F, Fut>(policy: &HttpClientConfig, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = backoff_delay(policy.retry_base_delay, attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    label,
                    attempt,
                    policy.max_retries + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Exponential delay for the given 1-based retry attempt, plus jitter.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let base_ms = base.as_millis() as u64;
    let exp_ms = base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(16));
    let jitter_range = std::cmp::max(1, exp_ms / 5);
    let jitter = rand::rng().random_range(0..jitter_range);
    Duration::from_millis(exp_ms.saturating_add(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Flaky(bool);

    impl Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "flaky(transient={})", self.0)
        }
    }

    impl Retryable for Flaky {
        fn is_transient(&self) -> bool {
            self.0
        }
    }

    fn policy(max_retries: u32) -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_secs(1),
            max_retries,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn backoff_doubles() {
        let base = Duration::from_millis(100);
        let first = backoff_delay(base, 1);
        let third = backoff_delay(base, 3);

        assert!(first >= Duration::from_millis(100) && first < Duration::from_millis(120));
        assert!(third >= Duration::from_millis(400) && third < Duration::from_millis(480));
    }

    #[test]
    fn huge_base_delay_saturates() {
        let delay = backoff_delay(Duration::from_millis(u64::MAX / 2), 8);
        assert_eq!(delay, Duration::from_millis(u64::MAX));
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<u32, Flaky> = with_retry(&policy(3), "test", || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Err(Flaky(true)) } else { Ok(n) }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), Flaky> = with_retry(&policy(2), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Flaky(true))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), Flaky> = with_retry(&policy(5), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Flaky(false))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
