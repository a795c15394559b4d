//! Retry policies and executors.
//!
//! Two policies are kept apart on purpose. Rate limiting is retried without
//! a cap, honouring the server's suggested wait. Transient server errors are
//! retried a fixed number of times, and running out of attempts fails the
//! calling test.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_client_error, classify_status};
pub use policy::{ErrorKind, RetryDecision, RetryOn, RetryPolicy};
pub use run::{retry_rate_limiting, retry_rate_limiting_blocking, retry_transient, run_with_retry};
