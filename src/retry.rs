//! # Throttle Retry
//!
//! Bounded retry-with-delay for remote calls rejected by control-plane rate
//! limiting. Applied explicitly at the typed-client call sites; only errors
//! the caller classifies as throttling are retried, everything else
//! propagates unchanged.

use std::future::Future;
use std::time::Duration;

use crate::constants::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_INTERVAL};

/// Retry budget for throttled calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay between attempts
    pub interval: Duration,
    /// Total attempts, including the first
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

/// Invoke `call` until it succeeds, fails with a non-retriable error, or the
/// attempt budget runs out. `on_retry` fires before every delay, giving the
/// caller a hook for logging. The last error is returned unchanged on
/// exhaustion.
pub async fn with_retries<T, E, Fut, Call, Retriable, OnRetry>(
    policy: RetryPolicy,
    mut call: Call,
    retriable: Retriable,
    mut on_retry: OnRetry,
) -> Result<T, E>
where
    Call: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Retriable: Fn(&E) -> bool,
    OnRetry: FnMut(),
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts && retriable(&error) => {
                on_retry();
                tokio::time::sleep(policy.interval).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum FakeError {
        Throttled,
        Fatal,
    }

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, FakeError> = with_retries(
            quick_policy(10),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(7) }
            },
            |_| true,
            || {},
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_throttled_until_success() {
        let calls = AtomicU32::new(0);
        let retries = AtomicU32::new(0);
        let result = with_retries(
            quick_policy(10),
            || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if attempt < 4 {
                        Err(FakeError::Throttled)
                    } else {
                        Ok("done")
                    }
                }
            },
            |error| *error == FakeError::Throttled,
            || {
                retries.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(retries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_propagate_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), FakeError> = with_retries(
            quick_policy(10),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Fatal) }
            },
            |error| *error == FakeError::Throttled,
            || {},
        )
        .await;
        assert_eq!(result.unwrap_err(), FakeError::Fatal);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausting_the_budget_surfaces_the_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), FakeError> = with_retries(
            quick_policy(3),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Throttled) }
            },
            |error| *error == FakeError::Throttled,
            || {},
        )
        .await;
        assert_eq!(result.unwrap_err(), FakeError::Throttled);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
