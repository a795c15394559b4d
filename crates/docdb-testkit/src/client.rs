//! The client seam the helpers drive.
//!
//! Partitioning, routing caches and request signing belong to the client.
//! The helpers only invoke them through these traits, so any implementation
//! (the in-process [`crate::emulator::Emulator`] or a test stub) can stand in.

use async_trait::async_trait;

use crate::error::{ClientError, Result};
use crate::headers::Headers;
use crate::request::{DocumentRequest, DocumentResponse};
use crate::resource::{Collection, PartitionKeyRange};
use crate::routing::EffectivePartitionKeyRange;

/// Executes requests against the service.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Gateway path: the client resolves partitions itself.
    async fn execute(&self, request: DocumentRequest) -> Result<DocumentResponse, ClientError>;

    /// Store path: the request must carry an explicit routing target and a
    /// signed authorization header.
    async fn execute_direct(
        &self,
        request: DocumentRequest,
    ) -> Result<DocumentResponse, ClientError>;

    fn collection_cache(&self) -> &dyn CollectionCache;

    fn routing_map_provider(&self) -> &dyn RoutingMapProvider;

    fn authorization(&self) -> &dyn AuthorizationTokenProvider;
}

/// Resolves the collection that owns a request's target.
#[async_trait]
pub trait CollectionCache: Send + Sync {
    async fn resolve_collection(
        &self,
        request: &DocumentRequest,
    ) -> Result<Collection, ClientError>;
}

/// Partition-key-range lookup for a collection.
#[async_trait]
pub trait RoutingMapProvider: Send + Sync {
    /// Ranges of `collection_rid` overlapping `range`, in key order.
    async fn overlapping_ranges(
        &self,
        collection_rid: &str,
        range: &EffectivePartitionKeyRange,
    ) -> Result<Vec<PartitionKeyRange>, ClientError>;
}

/// Produces the authorization header value for a request.
pub trait AuthorizationTokenProvider: Send + Sync {
    /// Sign `verb` on `resource_id` of `resource_type`. Stamps the date
    /// header when the request does not carry one yet.
    fn authorization_token(
        &self,
        verb: &str,
        resource_id: &str,
        resource_type: &str,
        headers: &mut Headers,
    ) -> Result<String>;
}
