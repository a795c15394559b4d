//! Classify client errors into retry policy error kinds.

use crate::error::{status, ClientError, TestkitError};
use crate::retry::policy::ErrorKind;

/// Classify a status code for retry decisions.
pub fn classify_status(code: u16) -> ErrorKind {
    match code {
        status::TOO_MANY_REQUESTS => ErrorKind::TooManyRequests,
        status::SERVICE_UNAVAILABLE => ErrorKind::ServiceUnavailable,
        status::GONE => ErrorKind::Gone,
        status::REQUEST_TIMEOUT => ErrorKind::RequestTimeout,
        status::INTERNAL_SERVER_ERROR => ErrorKind::InternalServerError,
        status::NOT_FOUND => ErrorKind::NotFound,
        _ => ErrorKind::Other,
    }
}

pub fn classify_client_error(e: &ClientError) -> ErrorKind {
    classify_status(e.status)
}

/// Classify any helper error. Only client errors can be retryable.
pub fn classify(e: &TestkitError) -> ErrorKind {
    match e {
        TestkitError::Client(ce) => classify_client_error(ce),
        _ => ErrorKind::Other,
    }
}
