//! Retry with exponential back-off and jitter.
//!
//! [`retry_with_backoff`] wraps any fallible async operation. The caller
//! supplies the [`RetryPolicy`] (how many attempts, how long to wait) and a
//! predicate that decides whether a given error is worth another attempt.
//! Errors the predicate rejects are returned immediately.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

const MAX_DELAY_MS: u64 = 60_000;

/// Maximum-attempts policy for one fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. `0` behaves like `1`.
    pub max_attempts: u32,
    /// Base delay for the exponential schedule.
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_attempts,
            backoff_base_ms,
        }
    }

    /// Delay before the `retry`-th retry (1-based), before jitter.
    fn base_delay_ms(&self, retry: u32) -> u64 {
        let computed = self
            .backoff_base_ms
            .saturating_mul(1u64 << retry.saturating_sub(1).min(10));
        computed.min(MAX_DELAY_MS)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1_000)
    }
}

/// Runs `operation` until it succeeds, `is_retriable` rejects the error, or
/// `policy.max_attempts` attempts have been made.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Retry | Sleep before it               |
/// |-------|-------------------------------|
/// | 1     | 1 000 ms × 2⁰ ± 25 % jitter  |
/// | 2     | 1 000 ms × 2¹ ± 25 % jitter  |
/// | 3     | 1 000 ms × 2² ± 25 % jitter  |
///
/// Delay is capped at 60 s. The last error is returned once attempts run out.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: RetryPolicy,
    is_retriable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let capped = policy.base_delay_ms(attempt);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "transient source error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::error::SourceError;

    fn server_error() -> SourceError {
        SourceError::UnexpectedStatus {
            service: "test",
            status: 503,
        }
    }

    #[test]
    fn delay_doubles_and_caps() {
        let policy = RetryPolicy::new(20, 1_000);
        assert_eq!(policy.base_delay_ms(1), 1_000);
        assert_eq!(policy.base_delay_ms(2), 2_000);
        assert_eq!(policy.base_delay_ms(3), 4_000);
        assert_eq!(policy.base_delay_ms(15), MAX_DELAY_MS);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(
            RetryPolicy::new(3, 0),
            SourceError::is_retriable,
            || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<u32, SourceError>(42)
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(
            RetryPolicy::new(3, 0),
            SourceError::is_retriable,
            || {
                let c = Arc::clone(&c);
                async move {
                    let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                    if attempt < 3 {
                        Err(server_error())
                    } else {
                        Ok::<u32, SourceError>(99)
                    }
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 99, "should succeed on the third attempt");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(
            RetryPolicy::new(3, 0),
            SourceError::is_retriable,
            || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(server_error())
                }
            },
        )
        .await;
        assert_eq!(
            calls.load(Ordering::SeqCst),
            3,
            "max_attempts=3 means three calls in total"
        );
        assert!(matches!(
            result,
            Err(SourceError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_fatal_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(
            RetryPolicy::new(3, 0),
            SourceError::is_retriable,
            || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(SourceError::Configuration("missing key".to_owned()))
                }
            },
        )
        .await;
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "Configuration must not be retried"
        );
        assert!(matches!(result, Err(SourceError::Configuration(_))));
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(
            RetryPolicy::new(0, 0),
            SourceError::is_retriable,
            || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(server_error())
                }
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
