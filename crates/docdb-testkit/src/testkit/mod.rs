//! Helper entry points for tests.
//!
//! [`Testkit`] wraps a [`DocumentClient`] and the configuration it was built
//! with. Resource operations, feeds, direct store helpers, fixtures, cleanup
//! and environment waits are split across the submodules as `impl Testkit`
//! blocks.

mod cleanup;
mod direct;
mod environment;
mod feed;
mod fixtures;
mod resources;

pub use environment::ConfigValue;
pub use fixtures::{DATA_SET_CHUNK, DATA_SET_PARTITION_KEY_PATH};

use std::future::Future;
use std::sync::Arc;

use crate::address::ResourceAddress;
use crate::client::DocumentClient;
use crate::config::TestkitConfig;
use crate::error::{Result, TestkitError};
use crate::resource::Resource;
use crate::retry::{self, RetryPolicy};

#[derive(Clone)]
pub struct Testkit {
    client: Arc<dyn DocumentClient>,
    config: TestkitConfig,
}

impl Testkit {
    pub fn new(client: Arc<dyn DocumentClient>, config: TestkitConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &dyn DocumentClient {
        self.client.as_ref()
    }

    pub fn config(&self) -> &TestkitConfig {
        &self.config
    }

    /// Unbounded 429 policy with the configured floor.
    pub fn rate_limiting_policy(&self) -> RetryPolicy {
        self.config.retry().rate_limiting_policy()
    }

    /// Fixed-attempt policy for 503, 410, 408 and 500.
    pub fn transient_policy(&self) -> RetryPolicy {
        self.config.retry().transient_policy()
    }

    /// Run `work`, retrying rate-limited failures.
    pub async fn retry_rate_limiting<T, F, Fut>(&self, work: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        retry::retry_rate_limiting(&self.rate_limiting_policy(), work).await
    }

    /// Run `work`, retrying transient server errors; running out of attempts fails the test.
    pub async fn retry_transient<T, F, Fut>(&self, work: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        retry::retry_transient(&self.transient_policy(), work).await
    }
}

/// Link of a stored resource.
pub(crate) fn stored_address<T: Resource>(resource: &T) -> Result<ResourceAddress> {
    resource.link().ok_or_else(|| {
        TestkitError::invalid_argument(format!("{} {} has not been stored", T::KIND, resource.id()))
    })
}

impl std::fmt::Debug for Testkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Testkit")
            .field("endpoint", &self.config.endpoint)
            .finish_non_exhaustive()
    }
}
