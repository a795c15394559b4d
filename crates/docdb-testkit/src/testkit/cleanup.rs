//! Cascading teardown of everything a test run created.

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::{stored_address, Testkit};
use crate::address::ResourceAddress;
use crate::error::{Result, TestkitError};
use crate::resource::{Collection, Database, Offer};
use crate::retry::{classify, ErrorKind};

/// Deletions in flight per round.
const CLEANUP_CONCURRENCY: usize = 10;

impl Testkit {
    /// Delete every database in the account.
    ///
    /// The sweep is attempted up to `retry.cleanup_attempts` times. Throttled
    /// and timed-out sweeps back off for `retry.cleanup_delay_ms`; a not-found
    /// (a resource vanished mid-sweep) is retried at once. The error of the
    /// last attempt is returned. Offers still present afterwards are only
    /// reported.
    #[instrument(skip(self))]
    pub async fn delete_all_databases(&self) -> Result<()> {
        let retry = self.config.retry();
        let attempts = retry.cleanup_attempts.max(1);
        let mut attempt = 1;
        loop {
            let e = match self.delete_all_databases_worker().await {
                Ok(()) => break,
                Err(e) => e,
            };
            if attempt >= attempts {
                warn!(attempt, error = %e, "giving up on database cleanup");
                return Err(e);
            }
            match classify(&e) {
                ErrorKind::TooManyRequests | ErrorKind::RequestTimeout => {
                    warn!(attempt, error = %e, "cleanup throttled, backing off");
                    tokio::time::sleep(retry.cleanup_delay()).await;
                }
                ErrorKind::NotFound => debug!(attempt, error = %e, "resource vanished during cleanup"),
                _ => warn!(attempt, error = %e, "cleanup attempt failed"),
            }
            attempt += 1;
        }

        let offers = self
            .list_all::<Offer>(ResourceAddress::Root, None, true)
            .await?;
        if !offers.is_empty() {
            warn!(count = offers.len(), "offers left after deleting all databases");
        }
        Ok(())
    }

    /// One sweep: list, delete a round of databases, repeat until the list is empty.
    async fn delete_all_databases_worker(&self) -> Result<()> {
        loop {
            let databases = self
                .retry_rate_limiting(|| self.list_all::<Database>(ResourceAddress::Root, None, false))
                .await?;
            if databases.is_empty() {
                return Ok(());
            }
            let round = &databases[..databases.len().min(CLEANUP_CONCURRENCY)];
            join_all(round.iter().map(|database| self.delete_database(database)))
                .await
                .into_iter()
                .collect::<Result<Vec<_>>>()?;
        }
    }

    /// Delete `database` after all of its collections.
    #[instrument(skip_all, fields(database = %database.id))]
    pub async fn delete_database(&self, database: &Database) -> Result<()> {
        self.delete_database_collections(database).await?;
        let address = stored_address(database)?;
        self.retry_rate_limiting(|| self.delete_strict::<Database>(address.clone(), None))
            .await?;
        info!("deleted database");
        Ok(())
    }

    /// Delete every collection of `database`, a round at a time.
    pub async fn delete_database_collections(&self, database: &Database) -> Result<()> {
        let parent = stored_address(database)?;
        loop {
            let collections = self
                .retry_rate_limiting(|| self.list_all::<Collection>(parent.clone(), None, false))
                .await?;
            if collections.is_empty() {
                return Ok(());
            }
            let round = &collections[..collections.len().min(CLEANUP_CONCURRENCY)];
            join_all(round.iter().map(|collection| async move {
                let address = stored_address(collection)?;
                self.retry_rate_limiting(|| self.delete_strict::<Collection>(address.clone(), None))
                    .await?;
                debug!(collection = %collection.id, "deleted collection");
                Ok::<(), TestkitError>(())
            }))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        }
    }
}
