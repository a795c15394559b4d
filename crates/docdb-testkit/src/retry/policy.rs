use std::time::Duration;

use crate::error::TestkitError;
use crate::retry::classify::classify;

/// Classification of a failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 429; the server asked us to slow down.
    TooManyRequests,
    /// 503.
    ServiceUnavailable,
    /// 410.
    Gone,
    /// 408.
    RequestTimeout,
    /// 500.
    InternalServerError,
    /// 404. Never retried; delete helpers treat it as success.
    NotFound,
    /// Anything else, including errors that did not come from the client.
    Other,
}

impl ErrorKind {
    /// Server errors the fixed-attempt policy retries.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::ServiceUnavailable
                | ErrorKind::Gone
                | ErrorKind::RequestTimeout
                | ErrorKind::InternalServerError
        )
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; hand the error back.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
    /// Retryable, but the attempt budget is spent.
    Exhausted,
}

/// Which failures a policy retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    RateLimiting,
    Transient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_on: RetryOn,
    /// Maximum number of attempts (including the first). `None` is unbounded.
    pub max_attempts: Option<u32>,
    /// Fixed delay for transient errors; lower bound of the wait for rate limiting.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::transient(5, Duration::from_secs(5))
    }
}

impl RetryPolicy {
    /// Retry 429 without a cap, waiting `max(suggested, floor)`.
    pub fn rate_limiting(floor: Duration) -> Self {
        Self {
            retry_on: RetryOn::RateLimiting,
            max_attempts: None,
            delay: floor,
        }
    }

    /// Retry 503, 410, 408 and 500 up to `max_attempts` total attempts.
    pub fn transient(max_attempts: u32, delay: Duration) -> Self {
        Self {
            retry_on: RetryOn::Transient,
            max_attempts: Some(max_attempts),
            delay,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn retries(&self, kind: ErrorKind) -> bool {
        match self.retry_on {
            RetryOn::RateLimiting => kind == ErrorKind::TooManyRequests,
            RetryOn::Transient => kind.is_transient(),
        }
    }

    /// Decide what to do after `attempt` (1-based) failed with `error`.
    pub fn decide(&self, attempt: u32, error: &TestkitError) -> RetryDecision {
        let kind = classify(error);
        if !self.retries(kind) {
            return RetryDecision::NoRetry;
        }
        if self.max_attempts.is_some_and(|max| attempt >= max) {
            return RetryDecision::Exhausted;
        }
        match self.retry_on {
            RetryOn::RateLimiting => {
                let suggested = error
                    .as_client_error()
                    .and_then(|e| e.retry_after)
                    .unwrap_or_default();
                RetryDecision::RetryAfter(suggested.max(self.delay))
            }
            RetryOn::Transient => RetryDecision::RetryAfter(self.delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    fn err(e: ClientError) -> TestkitError {
        TestkitError::Client(e)
    }

    #[test]
    fn rate_limiting_waits_at_least_the_floor() {
        let p = RetryPolicy::rate_limiting(Duration::from_secs(1));
        let none = err(ClientError::too_many_requests(None));
        let short = err(ClientError::too_many_requests(Some(Duration::from_millis(200))));
        let long = err(ClientError::too_many_requests(Some(Duration::from_millis(2500))));
        assert_eq!(p.decide(1, &none), RetryDecision::RetryAfter(Duration::from_secs(1)));
        assert_eq!(p.decide(1, &short), RetryDecision::RetryAfter(Duration::from_secs(1)));
        assert_eq!(
            p.decide(1, &long),
            RetryDecision::RetryAfter(Duration::from_millis(2500))
        );
    }

    #[test]
    fn rate_limiting_is_unbounded() {
        let p = RetryPolicy::rate_limiting(Duration::from_secs(1));
        let e = err(ClientError::too_many_requests(None));
        assert!(matches!(p.decide(10_000, &e), RetryDecision::RetryAfter(_)));
    }

    #[test]
    fn rate_limiting_ignores_other_failures() {
        let p = RetryPolicy::rate_limiting(Duration::from_secs(1));
        for e in [
            ClientError::service_unavailable(),
            ClientError::gone(),
            ClientError::not_found("x"),
            ClientError::conflict("x"),
        ] {
            assert_eq!(p.decide(1, &err(e)), RetryDecision::NoRetry);
        }
    }

    #[test]
    fn transient_retries_until_budget_is_spent() {
        let p = RetryPolicy::default();
        let e = err(ClientError::service_unavailable());
        for attempt in 1..5 {
            assert_eq!(
                p.decide(attempt, &e),
                RetryDecision::RetryAfter(Duration::from_secs(5))
            );
        }
        assert_eq!(p.decide(5, &e), RetryDecision::Exhausted);
    }

    #[test]
    fn transient_ignores_rate_limiting_and_not_found() {
        let p = RetryPolicy::default();
        assert_eq!(
            p.decide(1, &err(ClientError::too_many_requests(None))),
            RetryDecision::NoRetry
        );
        assert_eq!(
            p.decide(1, &err(ClientError::not_found("x"))),
            RetryDecision::NoRetry
        );
    }

    #[test]
    fn capped_rate_limiting_exhausts() {
        let p = RetryPolicy::rate_limiting(Duration::ZERO).with_max_attempts(Some(2));
        let e = err(ClientError::too_many_requests(None));
        assert_eq!(p.decide(1, &e), RetryDecision::RetryAfter(Duration::ZERO));
        assert_eq!(p.decide(2, &e), RetryDecision::Exhausted);
    }
}
