//! Create-or-get fixtures and bulk data seeding.

use futures::stream::{FuturesUnordered, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::{stored_address, Testkit};
use crate::address::ResourceAddress;
use crate::error::Result;
use crate::headers::{names, Headers};
use crate::resource::{Collection, Database, Document, PartitionKeyDefinition, Resource, User};

/// Documents created concurrently per round while seeding.
pub const DATA_SET_CHUNK: usize = 100;
/// Partition key path of seeded collections.
pub const DATA_SET_PARTITION_KEY_PATH: &str = "/partitionKey";

const DATA_SET_FIELDS: u32 = 19;
const DATA_SET_FIELD_MAX: u32 = 100_000;
const FIXTURE_COLLECTION_THROUGHPUT: i64 = 10_000;

fn random_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn data_set_document(n: usize, rng: &mut impl Rng) -> Document {
    let mut document =
        Document::new(format!("documentId{n}")).with_property("partitionKey", n as u64);
    for k in 1..=DATA_SET_FIELDS {
        document = document.with_property(format!("field_{k}"), rng.gen_range(0..DATA_SET_FIELD_MAX));
    }
    document
}

impl Testkit {
    /// Create a database named `name`, or a random name when none is given.
    pub async fn create_database(&self, name: Option<&str>) -> Result<Database> {
        let id = name
            .filter(|n| !n.trim().is_empty())
            .map_or_else(random_id, str::to_string);
        self.create(ResourceAddress::Root, &Database::new(id), None).await
    }

    /// First existing database, or a new one.
    pub async fn create_or_get_database(&self) -> Result<Database> {
        let databases = self
            .list_all::<Database>(ResourceAddress::Root, None, false)
            .await?;
        match databases.into_iter().next() {
            Some(database) => Ok(database),
            None => self.create_database(None).await,
        }
    }

    pub async fn create_or_get_user(&self) -> Result<(User, Database)> {
        let database = self.create_or_get_database().await?;
        let parent = stored_address(&database)?;
        let users = self.list_all::<User>(parent.clone(), None, false).await?;
        let user = match users.first() {
            Some(existing) => self.read::<User>(stored_address(existing)?, None).await?,
            None => self.create(parent, &User::new(random_id()), None).await?,
        };
        Ok((user, database))
    }

    pub async fn upsert_user(&self) -> Result<(User, Database)> {
        let database = self.create_or_get_database().await?;
        let user = self
            .upsert(
                ResourceAddress::parse(database.id_or_full_name()),
                &User::new(random_id()),
                None,
            )
            .await?;
        Ok((user, database))
    }

    /// Create a collection in `database`, provisioning `throughput` when given.
    pub async fn create_collection(
        &self,
        database: &Database,
        settings: &Collection,
        throughput: Option<i64>,
    ) -> Result<Collection> {
        let mut headers = Headers::new();
        if let Some(throughput) = throughput {
            headers.insert(names::OFFER_THROUGHPUT, throughput.to_string());
        }
        let collection = self
            .create(stored_address(database)?, settings, Some(&headers))
            .await?;
        debug!(database = %database.id, collection = %collection.id, ?throughput, "created collection");
        Ok(collection)
    }

    pub async fn create_or_get_collection(&self) -> Result<(Collection, Database)> {
        let database = self.create_or_get_database().await?;
        let collections = self
            .list_all::<Collection>(stored_address(&database)?, None, false)
            .await?;
        let collection = match collections.first() {
            Some(existing) => self.read::<Collection>(stored_address(existing)?, None).await?,
            None => {
                self.create_collection(
                    &database,
                    &Collection::new(random_id()),
                    Some(FIXTURE_COLLECTION_THROUGHPUT),
                )
                .await?
            }
        };
        Ok((collection, database))
    }

    /// First document of the fixture collection, or a new one once replicated.
    pub async fn create_or_get_document(&self) -> Result<(Document, Collection, Database)> {
        let (collection, database) = self.create_or_get_collection().await?;
        let parent = stored_address(&collection)?;
        let documents = self.list_all::<Document>(parent.clone(), None, false).await?;
        let document = match documents.first() {
            Some(existing) => self.read::<Document>(stored_address(existing)?, None).await?,
            None => {
                let created = self.create(parent, &Document::new(random_id()), None).await?;
                self.wait_for_server_replication().await;
                created
            }
        };
        Ok((document, collection, database))
    }

    pub async fn upsert_document(&self) -> Result<(Document, Collection, Database)> {
        let (collection, database) = self.create_or_get_collection().await?;
        let document = self
            .upsert(
                ResourceAddress::parse(collection.id_or_full_name()),
                &Document::new(random_id()),
                None,
            )
            .await?;
        Ok((document, collection, database))
    }

    /// Seed `database`/`collection` with `documents` generated documents.
    ///
    /// The collection is hash-partitioned on `/partitionKey`. Documents are
    /// created [`DATA_SET_CHUNK`] at a time; each chunk is drained in
    /// completion order before the next one starts.
    pub async fn create_data_set(
        &self,
        database: &str,
        collection: &str,
        documents: usize,
        throughput: i64,
    ) -> Result<Collection> {
        let database = self.create_database(Some(database)).await?;
        let settings = Collection::new(collection)
            .with_partition_key(PartitionKeyDefinition::hash(DATA_SET_PARTITION_KEY_PATH));
        let collection = self
            .create_collection(&database, &settings, Some(throughput))
            .await?;
        let parent = stored_address(&collection)?;

        let mut rng = StdRng::from_entropy();
        for start in (0..documents).step_by(DATA_SET_CHUNK) {
            let end = (start + DATA_SET_CHUNK).min(documents);
            let mut pending: FuturesUnordered<_> = (start..end)
                .map(|n| {
                    let document = data_set_document(n, &mut rng);
                    let parent = parent.clone();
                    async move { self.create(parent, &document, None).await }
                })
                .collect();
            while let Some(created) = pending.next().await {
                created?;
            }
            debug!(created = end, total = documents, "seeded chunk");
        }
        info!(
            database = %database.id,
            collection = %collection.id,
            documents,
            "created data set"
        );
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_set_document_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let doc = data_set_document(42, &mut rng);
        assert_eq!(doc.id, "documentId42");
        assert_eq!(doc.get("partitionKey"), Some(&json!(42)));
        assert_eq!(doc.properties.len(), 1 + DATA_SET_FIELDS as usize);
        for k in 1..=DATA_SET_FIELDS {
            let v = doc.get(&format!("field_{k}")).and_then(|v| v.as_u64()).unwrap();
            assert!(v < u64::from(DATA_SET_FIELD_MAX));
        }
        assert!(doc.get("field_20").is_none());
    }

    #[test]
    fn random_ids_are_simple_uuids() {
        let id = random_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
