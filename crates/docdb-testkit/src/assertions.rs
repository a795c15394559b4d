//! Test-fatal assertions.

use tracing::error;

use crate::error::ClientError;

/// Fail the calling test unconditionally.
#[track_caller]
pub fn fail_test(message: impl AsRef<str>) -> ! {
    let message = message.as_ref();
    error!(%message, "test failed");
    panic!("{message}");
}

/// Require `error` to carry an activity id and one of `expected` statuses.
#[track_caller]
pub fn assert_client_error(error: &ClientError, expected: &[u16]) {
    if error.activity_id.is_none() {
        fail_test(format!("error has no activity id: {error}"));
    }
    if !expected.contains(&error.status) {
        let expected = expected
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");
        fail_test(format!(
            "status {} did not match any of the expected statuses {expected}, details {error}",
            error.status
        ));
    }
}
