use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::assertions::fail_test;
use crate::error::{Result, TestkitError};
use crate::retry::policy::{RetryDecision, RetryOn, RetryPolicy};

/// Runs `work` until it succeeds or the policy says to stop.
/// On a retryable failure, sleeps for the policy's delay then tries again.
///
/// When a transient policy runs out of attempts the calling test fails; a
/// capped rate-limiting policy hands the last error back instead.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut work: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1u32;
    loop {
        match work().await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt, &e) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(delay) => {
                    log_retry(policy, attempt, &e, delay);
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                RetryDecision::Exhausted => return exhausted(policy, attempt, e),
            },
        }
    }
}

/// Retry rate-limited work, honouring `max(server suggestion, floor)`.
pub async fn retry_rate_limiting<T, F, Fut>(policy: &RetryPolicy, work: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    debug_assert_eq!(policy.retry_on, RetryOn::RateLimiting);
    run_with_retry(policy, work).await
}

/// Retry work failing with transient server errors; exhaustion fails the test.
pub async fn retry_transient<T, F, Fut>(policy: &RetryPolicy, work: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    debug_assert_eq!(policy.retry_on, RetryOn::Transient);
    run_with_retry(policy, work).await
}

/// Blocking variant of [`retry_rate_limiting`] for synchronous closures.
/// Sleeps the calling thread between attempts.
pub fn retry_rate_limiting_blocking<T, F>(policy: &RetryPolicy, mut work: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 1u32;
    loop {
        match work() {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt, &e) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(delay) => {
                    log_retry(policy, attempt, &e, delay);
                    std::thread::sleep(delay);
                    attempt = attempt.saturating_add(1);
                }
                RetryDecision::Exhausted => return exhausted(policy, attempt, e),
            },
        }
    }
}

fn log_retry(policy: &RetryPolicy, attempt: u32, e: &TestkitError, delay: Duration) {
    let status = e.as_client_error().map(|c| c.status);
    match policy.retry_on {
        RetryOn::RateLimiting => debug!(
            attempt,
            ?status,
            retry_after_ms = millis(delay),
            "rate limited, retrying"
        ),
        RetryOn::Transient => warn!(
            attempt,
            ?status,
            retry_after_ms = millis(delay),
            error = %e,
            "transient failure, retrying"
        ),
    }
}

fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

fn exhausted<T>(policy: &RetryPolicy, attempt: u32, e: TestkitError) -> Result<T> {
    match policy.retry_on {
        RetryOn::Transient => fail_test(format!(
            "service is not available after {attempt} attempts: {e}"
        )),
        RetryOn::RateLimiting => {
            warn!(attempt, error = %e, "rate limiting persisted past the attempt cap");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_transient() -> RetryPolicy {
        RetryPolicy::transient(5, Duration::ZERO)
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let v = retry_transient(&fast_transient(), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestkitError>(7)
            }
        })
        .await
        .unwrap();
        assert_eq!(v, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_recovers_within_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let v = retry_transient(&fast_transient(), move || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 4 {
                    Err(ClientError::gone().into())
                } else {
                    Ok("ok")
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(v, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    #[should_panic(expected = "service is not available after 5 attempts")]
    async fn transient_exhaustion_fails_the_test() {
        let _ = retry_transient(&fast_transient(), || async {
            Err::<(), _>(ClientError::service_unavailable().into())
        })
        .await;
    }

    #[tokio::test]
    async fn non_retryable_error_propagates_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let err = retry_transient(&fast_transient(), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ClientError::conflict("exists").into())
            }
        })
        .await
        .unwrap_err();
        assert_eq!(err.as_client_error().map(|e| e.status), Some(409));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blocking_rate_limit_retries_then_succeeds() {
        let policy = RetryPolicy::rate_limiting(Duration::ZERO);
        let mut calls = 0;
        let v = retry_rate_limiting_blocking(&policy, || {
            calls += 1;
            if calls < 3 {
                Err(ClientError::too_many_requests(Some(Duration::from_millis(1))).into())
            } else {
                Ok(calls)
            }
        })
        .unwrap();
        assert_eq!(v, 3);
    }

    #[test]
    fn blocking_rate_limit_cap_returns_error() {
        let policy = RetryPolicy::rate_limiting(Duration::ZERO).with_max_attempts(Some(3));
        let mut calls = 0;
        let err = retry_rate_limiting_blocking(&policy, || {
            calls += 1;
            Err::<(), _>(ClientError::too_many_requests(None).into())
        })
        .unwrap_err();
        assert_eq!(err.as_client_error().map(|e| e.status), Some(429));
        assert_eq!(calls, 3);
    }

    #[test]
    fn uncapped_rate_limiting_keeps_retrying_at_the_attempt_ceiling() {
        let policy = RetryPolicy::rate_limiting(Duration::from_millis(3));
        let e: TestkitError = ClientError::too_many_requests(None).into();
        assert_eq!(
            policy.decide(u32::MAX, &e),
            RetryDecision::RetryAfter(Duration::from_millis(3))
        );
    }

    #[test]
    fn logged_delay_saturates_instead_of_truncating() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
