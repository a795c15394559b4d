//! Synchronous facade over [`Testkit`] for tests without an async runtime.
//!
//! Every method blocks the calling thread until the underlying async
//! operation completes. Calling any of them from inside a Tokio runtime
//! panics.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::address::ResourceAddress;
use crate::client::DocumentClient;
use crate::config::TestkitConfig;
use crate::emulator::Emulator;
use crate::error::Result;
use crate::headers::Headers;
use crate::request::DocumentResponse;
use crate::resource::{Collection, Database, Resource};
use crate::retry;
use crate::testkit::Testkit;

pub struct BlockingTestkit {
    runtime: Runtime,
    inner: Testkit,
}

impl BlockingTestkit {
    pub fn new(client: Arc<dyn DocumentClient>, config: TestkitConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            runtime,
            inner: Testkit::new(client, config),
        })
    }

    /// A facade over a fresh in-memory emulator. The emulator is returned too
    /// so tests can inject faults and inspect the request log.
    pub fn with_emulator(config: TestkitConfig) -> Result<(Self, Arc<Emulator>)> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let emulator = Arc::new(runtime.block_on(Emulator::in_memory(&config))?);
        let client: Arc<dyn DocumentClient> = emulator.clone();
        let facade = Self {
            runtime,
            inner: Testkit::new(client, config),
        };
        Ok((facade, emulator))
    }

    /// The async helpers this facade drives.
    pub fn testkit(&self) -> &Testkit {
        &self.inner
    }

    /// Blocks until `future` completes.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Blocks until the resource at `address` has been read.
    pub fn read<T: Resource>(
        &self,
        address: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
    ) -> Result<T> {
        self.block_on(self.inner.read(address, headers))
    }

    /// Blocks until the resource has been read, retrying transient failures.
    pub fn read_with_retry<T: Resource>(
        &self,
        address: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
    ) -> Result<T> {
        self.block_on(self.inner.read_with_retry(address, headers))
    }

    /// Blocks until `resource` has been created under `parent`.
    pub fn create<T: Resource>(
        &self,
        parent: impl Into<ResourceAddress>,
        resource: &T,
        headers: Option<&Headers>,
    ) -> Result<T> {
        self.block_on(self.inner.create(parent, resource, headers))
    }

    /// Blocks until `resource` has been upserted under `parent`.
    pub fn upsert<T: Resource>(
        &self,
        parent: impl Into<ResourceAddress>,
        resource: &T,
        headers: Option<&Headers>,
    ) -> Result<T> {
        self.block_on(self.inner.upsert(parent, resource, headers))
    }

    /// Blocks until `resource` has been replaced.
    pub fn update<T: Resource>(&self, resource: &T, headers: Option<&Headers>) -> Result<T> {
        self.block_on(self.inner.update(resource, headers))
    }

    /// Blocks until the delete completes; a missing resource is a not-found response.
    pub fn delete<T: Resource>(
        &self,
        address: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
    ) -> Result<DocumentResponse> {
        self.block_on(self.inner.delete::<T>(address, headers))
    }

    /// Blocks until every page of the feed under `container` has been read.
    pub fn list_all<T: Resource>(
        &self,
        container: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
        read_with_retry: bool,
    ) -> Result<Vec<T>> {
        self.block_on(self.inner.list_all(container, headers, read_with_retry))
    }

    /// Blocks until the database has been created.
    pub fn create_database(&self, name: Option<&str>) -> Result<Database> {
        self.block_on(self.inner.create_database(name))
    }

    /// Blocks until an existing database is found or a new one created.
    pub fn create_or_get_database(&self) -> Result<Database> {
        self.block_on(self.inner.create_or_get_database())
    }

    /// Blocks until the collection has been created.
    pub fn create_collection(
        &self,
        database: &Database,
        settings: &Collection,
        throughput: Option<i64>,
    ) -> Result<Collection> {
        self.block_on(self.inner.create_collection(database, settings, throughput))
    }

    /// Blocks until every document of the data set has been created.
    pub fn create_data_set(
        &self,
        database: &str,
        collection: &str,
        documents: usize,
        throughput: i64,
    ) -> Result<Collection> {
        self.block_on(
            self.inner
                .create_data_set(database, collection, documents, throughput),
        )
    }

    /// Blocks until `database` and its collections are gone.
    pub fn delete_database(&self, database: &Database) -> Result<()> {
        self.block_on(self.inner.delete_database(database))
    }

    /// Blocks until every database has been deleted.
    pub fn delete_all_databases(&self) -> Result<()> {
        self.block_on(self.inner.delete_all_databases())
    }

    /// Runs the synchronous `work`, sleeping the calling thread between
    /// rate-limited attempts.
    pub fn retry_rate_limiting<T, F>(&self, work: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        retry::retry_rate_limiting_blocking(&self.inner.rate_limiting_policy(), work)
    }
}

impl std::fmt::Debug for BlockingTestkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingTestkit")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
