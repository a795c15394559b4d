//! In-process emulator implementing the client seam over SQLite.
//!
//! It keeps the semantics the helpers rely on: name and rid addressing,
//! conflicts on duplicate ids, cascading deletes, paged feeds with
//! continuation tokens, partition key ranges per collection and master-key
//! signed direct requests. Faults can be scripted per operation and kind.

mod faults;
mod handlers;
mod partitioning;
mod store;

pub use faults::FaultRule;
pub use partitioning::{effective_partition_key, split_ranges};

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

use crate::auth::MasterKeyAuthorization;
use crate::client::{
    AuthorizationTokenProvider, CollectionCache, DocumentClient, RoutingMapProvider,
};
use crate::config::{EmulatorConfig, TestkitConfig};
use crate::error::{status, ClientError, Result};
use crate::headers::names;
use crate::request::{DocumentRequest, DocumentResponse, OperationType};
use crate::resource::{Collection, PartitionKeyRange, ResourceKind};
use crate::routing::EffectivePartitionKeyRange;
use faults::Faults;
use handlers::Located;
use store::storage_error;

/// One request as the emulator saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedRequest {
    pub operation: OperationType,
    pub kind: ResourceKind,
    pub address: String,
    pub direct: bool,
    pub range_id: Option<String>,
    pub status: u16,
}

pub struct Emulator {
    pool: Pool<Sqlite>,
    config: EmulatorConfig,
    auth: MasterKeyAuthorization,
    faults: Faults,
    log: Mutex<Vec<LoggedRequest>>,
}

impl Emulator {
    /// Fresh emulator whose data lives only as long as the value.
    pub async fn in_memory(config: &TestkitConfig) -> Result<Self> {
        let pool = store::open_memory().await?;
        Self::with_pool(pool, config)
    }

    /// Open (or create) an emulator persisted at `path`.
    pub async fn open_at(path: impl AsRef<Path>, config: &TestkitConfig) -> Result<Self> {
        let path = path.as_ref();
        let pool = store::open_at(path).await?;
        info!(path = %path.display(), "opened emulator store");
        Self::with_pool(pool, config)
    }

    fn with_pool(pool: Pool<Sqlite>, config: &TestkitConfig) -> Result<Self> {
        Ok(Self {
            pool,
            config: config.emulator(),
            auth: MasterKeyAuthorization::new(&config.master_key)?,
            faults: Faults::default(),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Fail upcoming matching requests as described by `rule`.
    pub fn inject_fault(&self, rule: FaultRule) {
        self.faults.push(rule);
    }

    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    /// Every request executed so far, in arrival order.
    pub fn request_log(&self) -> Vec<LoggedRequest> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_request_log(&self) {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    async fn dispatch(
        &self,
        request: DocumentRequest,
        direct: bool,
    ) -> std::result::Result<DocumentResponse, ClientError> {
        let activity_id = request
            .activity_id()
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let outcome = self.process(&request, direct).await;
        let status = match &outcome {
            Ok(resp) => resp.status,
            Err(e) => e.status,
        };
        debug!(
            operation = ?request.operation,
            kind = %request.kind,
            address = %request.address,
            direct,
            status,
            "handled request"
        );
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(LoggedRequest {
                operation: request.operation,
                kind: request.kind,
                address: request.address.as_str().to_string(),
                direct,
                range_id: request.route.as_ref().map(|r| r.range_id.clone()),
                status,
            });

        match outcome {
            Ok(mut resp) => {
                resp.headers.insert(names::ACTIVITY_ID, activity_id);
                Ok(resp)
            }
            Err(e) => Err(e.with_activity_id(activity_id)),
        }
    }

    async fn process(
        &self,
        request: &DocumentRequest,
        direct: bool,
    ) -> std::result::Result<DocumentResponse, ClientError> {
        if let Some(error) = self.faults.take(request) {
            return Err(error);
        }
        if direct {
            self.check_direct(request)?;
        }
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        let response = handlers::handle(&mut tx, &self.config, request).await?;
        tx.commit().await.map_err(storage_error)?;
        Ok(response)
    }

    /// Store-path requests must be signed and, below a collection, routed.
    fn check_direct(&self, request: &DocumentRequest) -> std::result::Result<(), ClientError> {
        let unauthorized = |message: &str| ClientError::new(status::UNAUTHORIZED, message);
        let token = request
            .headers
            .get(names::AUTHORIZATION)
            .ok_or_else(|| unauthorized("authorization header is missing"))?;
        let date = request
            .headers
            .get(names::X_DATE)
            .ok_or_else(|| unauthorized("x-ms-date header is missing"))?;
        let signed = self.auth.verify(
            token,
            request.operation.http_verb(),
            request.address.as_str(),
            request.kind.path_segment(),
            date,
        );
        if !signed {
            return Err(unauthorized("the authorization signature does not match"));
        }
        if request.kind.is_collection_child() && request.route.is_none() {
            return Err(ClientError::bad_request(
                "direct requests below a collection need a partition key range",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentClient for Emulator {
    async fn execute(
        &self,
        request: DocumentRequest,
    ) -> std::result::Result<DocumentResponse, ClientError> {
        self.dispatch(request, false).await
    }

    async fn execute_direct(
        &self,
        request: DocumentRequest,
    ) -> std::result::Result<DocumentResponse, ClientError> {
        self.dispatch(request, true).await
    }

    fn collection_cache(&self) -> &dyn CollectionCache {
        self
    }

    fn routing_map_provider(&self) -> &dyn RoutingMapProvider {
        self
    }

    fn authorization(&self) -> &dyn AuthorizationTokenProvider {
        &self.auth
    }
}

#[async_trait]
impl CollectionCache for Emulator {
    async fn resolve_collection(
        &self,
        request: &DocumentRequest,
    ) -> std::result::Result<Collection, ClientError> {
        let mut conn = self.pool.acquire().await.map_err(storage_error)?;
        let mut located = handlers::locate(&mut conn, &request.address).await?;
        loop {
            let resource = match located {
                Located::Root => {
                    return Err(ClientError::bad_request(format!(
                        "{} does not target a collection",
                        request.address
                    )))
                }
                Located::Resource(resource) => resource,
            };
            if resource.kind == ResourceKind::Collection {
                return serde_json::from_value(resource.body)
                    .map_err(|e| ClientError::internal(format!("stored collection: {e}")));
            }
            if resource.parent_rid == store::ROOT_RID {
                located = Located::Root;
                continue;
            }
            located = store::find_by_rid(&mut conn, &resource.parent_rid)
                .await?
                .map(Located::Resource)
                .ok_or_else(|| ClientError::not_found("owning collection does not exist"))?;
        }
    }
}

#[async_trait]
impl RoutingMapProvider for Emulator {
    async fn overlapping_ranges(
        &self,
        collection_rid: &str,
        range: &EffectivePartitionKeyRange,
    ) -> std::result::Result<Vec<PartitionKeyRange>, ClientError> {
        let mut conn = self.pool.acquire().await.map_err(storage_error)?;
        let ranges = store::ranges_for(&mut conn, collection_rid).await?;
        if ranges.is_empty() && store::find_by_rid(&mut conn, collection_rid).await?.is_none() {
            return Err(ClientError::not_found(format!(
                "collection {collection_rid} does not exist"
            )));
        }
        Ok(ranges
            .into_iter()
            .filter(|r| EffectivePartitionKeyRange::of(r).overlaps(range))
            .collect())
    }
}
