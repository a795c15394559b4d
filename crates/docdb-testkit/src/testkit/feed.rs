//! Feed reads and the continuation-draining listing.

use std::future::Future;

use tracing::debug;

use super::Testkit;
use crate::address::ResourceAddress;
use crate::error::Result;
use crate::headers::Headers;
use crate::request::{DocumentRequest, FeedPage, OperationType};
use crate::resource::Resource;
use crate::routing::route_to_only_partition;

impl Testkit {
    /// Read one page of `T` under `container`. Partitioned kinds are routed
    /// to the collection's only partition.
    pub async fn read_feed<T: Resource>(
        &self,
        container: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
    ) -> Result<FeedPage<T>> {
        let mut request =
            DocumentRequest::new(OperationType::ReadFeed, T::KIND, container.into(), headers);
        if T::KIND.is_partitioned() {
            let client = self.client();
            route_to_only_partition(
                client.collection_cache(),
                client.routing_map_provider(),
                &mut request,
            )
            .await?;
        }
        self.send(request).await?.feed()
    }

    pub async fn read_feed_with_retry<T: Resource>(
        &self,
        container: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
    ) -> Result<FeedPage<T>> {
        let container = container.into();
        self.retry_transient(|| self.read_feed::<T>(container.clone(), headers))
            .await
    }

    /// Every `T` under `container`, across all pages, in server order.
    pub async fn list_all<T: Resource>(
        &self,
        container: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
        read_with_retry: bool,
    ) -> Result<Vec<T>> {
        let container = container.into();
        let items = drain_pages(headers, |page_headers| {
            let container = container.clone();
            async move {
                if read_with_retry {
                    self.read_feed_with_retry::<T>(container, Some(&page_headers))
                        .await
                } else {
                    self.read_feed::<T>(container, Some(&page_headers)).await
                }
            }
        })
        .await?;
        debug!(kind = %T::KIND, %container, count = items.len(), "listed all");
        Ok(items)
    }
}

/// Read pages until the continuation comes back empty, carrying each page's
/// continuation into the next request's headers.
pub(crate) async fn drain_pages<T, F, Fut>(headers: Option<&Headers>, mut read_page: F) -> Result<Vec<T>>
where
    F: FnMut(Headers) -> Fut,
    Fut: Future<Output = Result<FeedPage<T>>>,
{
    let mut page_headers = headers.cloned().unwrap_or_default();
    let mut items = Vec::new();
    loop {
        let page = read_page(page_headers.clone()).await?;
        items.extend(page.items);
        match page.continuation {
            Some(token) => page_headers.set_continuation(token),
            None => return Ok(items),
        }
    }
}
