//! Error types shared by the helpers, the client seam and the emulator.

use std::time::Duration;
use thiserror::Error;

use crate::routing::RoutingError;

/// Status codes the helpers and the emulator care about.
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const NO_CONTENT: u16 = 204;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const NOT_FOUND: u16 = 404;
    pub const METHOD_NOT_ALLOWED: u16 = 405;
    pub const REQUEST_TIMEOUT: u16 = 408;
    pub const CONFLICT: u16 = 409;
    pub const GONE: u16 = 410;
    pub const TOO_MANY_REQUESTS: u16 = 429;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const SERVICE_UNAVAILABLE: u16 = 503;
}

/// Sub-status sent with 410 when a routed request names a range that does not exist.
pub const SUB_STATUS_PARTITION_KEY_RANGE_GONE: u32 = 1002;

/// Classified failure returned by a [`crate::client::DocumentClient`].
///
/// The status code drives retry classification; `retry_after` carries the
/// server's suggested wait on rate-limited responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status {status}: {message}")]
pub struct ClientError {
    pub status: u16,
    pub sub_status: Option<u32>,
    pub message: String,
    pub activity_id: Option<String>,
    pub retry_after: Option<Duration>,
}

impl ClientError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            sub_status: None,
            message: message.into(),
            activity_id: None,
            retry_after: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(status::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(status::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(status::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(status::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable() -> Self {
        Self::new(status::SERVICE_UNAVAILABLE, "service is unavailable")
    }

    pub fn gone() -> Self {
        Self::new(status::GONE, "the requested resource is no longer available at the server")
    }

    pub fn request_timeout() -> Self {
        Self::new(status::REQUEST_TIMEOUT, "request timed out")
    }

    /// 429 with an optional server-suggested wait.
    pub fn too_many_requests(retry_after: Option<Duration>) -> Self {
        Self {
            retry_after,
            ..Self::new(status::TOO_MANY_REQUESTS, "request rate is large")
        }
    }

    pub fn with_sub_status(mut self, sub_status: u32) -> Self {
        self.sub_status = Some(sub_status);
        self
    }

    pub fn with_activity_id(mut self, activity_id: impl Into<String>) -> Self {
        self.activity_id = Some(activity_id.into());
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.status == status::NOT_FOUND
    }
}

/// Everything a helper can fail with.
#[derive(Debug, Error)]
pub enum TestkitError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("storage: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl TestkitError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        TestkitError::InvalidArgument(message.into())
    }

    /// The classified client error, if this failure came from the client seam.
    pub fn as_client_error(&self) -> Option<&ClientError> {
        match self {
            TestkitError::Client(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T, E = TestkitError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_requests_carries_retry_after() {
        let e = ClientError::too_many_requests(Some(Duration::from_millis(1500)));
        assert_eq!(e.status, status::TOO_MANY_REQUESTS);
        assert_eq!(e.retry_after, Some(Duration::from_millis(1500)));

        let hinted = ClientError::too_many_requests(None).with_retry_after(Duration::from_millis(20));
        assert_eq!(hinted.retry_after, Some(Duration::from_millis(20)));
    }

    #[test]
    fn client_error_is_reachable_through_testkit_error() {
        let err: TestkitError = ClientError::not_found("gone fishing").into();
        let client = err.as_client_error().expect("client error");
        assert!(client.is_not_found());
        assert_eq!(err.to_string(), "status 404: gone fishing");
    }

    #[test]
    fn non_client_errors_have_no_client_view() {
        let err = TestkitError::invalid_argument("verb");
        assert!(err.as_client_error().is_none());
    }
}
