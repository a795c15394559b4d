//! Script operations sent straight to the store path.
//!
//! The store path does no routing or signing of its own: each request is
//! signed with the client's master key, bound to the collection's only
//! partition and then dispatched with `execute_direct`.

use tracing::{debug, instrument};

use super::feed::drain_pages;
use super::Testkit;
use crate::address::ResourceAddress;
use crate::error::{Result, TestkitError};
use crate::headers::{names, Headers};
use crate::request::{DocumentRequest, DocumentResponse, FeedPage, OperationType};
use crate::resource::Resource;
use crate::routing::route_to_only_partition;

impl Testkit {
    async fn send_direct(&self, mut request: DocumentRequest) -> Result<DocumentResponse> {
        let client = self.client();
        let token = client.authorization().authorization_token(
            request.operation.http_verb(),
            request.address.as_str(),
            request.kind.path_segment(),
            &mut request.headers,
        )?;
        request.headers.insert(names::AUTHORIZATION, token);
        if !request.headers.contains(names::ACTIVITY_ID) {
            request
                .headers
                .insert(names::ACTIVITY_ID, uuid::Uuid::new_v4().to_string());
        }
        route_to_only_partition(
            client.collection_cache(),
            client.routing_map_provider(),
            &mut request,
        )
        .await?;
        debug!(
            operation = ?request.operation,
            kind = %request.kind,
            address = %request.address,
            "sending direct request"
        );
        Ok(client.execute_direct(request).await?)
    }

    #[instrument(skip_all, fields(kind = %T::KIND, id = resource.id()))]
    pub async fn create_script_direct<T: Resource>(
        &self,
        collection: impl Into<ResourceAddress>,
        resource: &T,
    ) -> Result<T> {
        let request =
            DocumentRequest::with_resource(OperationType::Create, collection.into(), resource, None)?;
        self.send_direct(request).await?.resource()
    }

    #[instrument(skip_all, fields(kind = %T::KIND, id = resource.id()))]
    pub async fn update_script_direct<T: Resource>(&self, resource: &T) -> Result<T> {
        let address = resource.link().ok_or_else(|| {
            TestkitError::invalid_argument(format!("{} {} has not been stored", T::KIND, resource.id()))
        })?;
        let request = DocumentRequest::with_resource(OperationType::Replace, address, resource, None)?;
        self.send_direct(request).await?.resource()
    }

    #[instrument(skip_all, fields(kind = %T::KIND))]
    pub async fn delete_script_direct<T: Resource>(
        &self,
        address: impl Into<ResourceAddress>,
    ) -> Result<DocumentResponse> {
        let request = DocumentRequest::new(OperationType::Delete, T::KIND, address.into(), None);
        self.send_direct(request).await
    }

    async fn read_script_feed_direct<T: Resource>(
        &self,
        container: ResourceAddress,
        headers: &Headers,
    ) -> Result<FeedPage<T>> {
        let request = DocumentRequest::new(OperationType::ReadFeed, T::KIND, container, Some(headers));
        self.send_direct(request).await?.feed()
    }

    /// Every script of kind `T` in `collection`, retrying transient failures per page.
    #[instrument(skip_all, fields(kind = %T::KIND))]
    pub async fn list_all_script_direct<T: Resource>(
        &self,
        collection: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
    ) -> Result<Vec<T>> {
        let collection = collection.into();
        drain_pages(headers, |page_headers| {
            let collection = collection.clone();
            async move {
                self.retry_transient(|| {
                    self.read_script_feed_direct::<T>(collection.clone(), &page_headers)
                })
                .await
            }
        })
        .await
    }
}
