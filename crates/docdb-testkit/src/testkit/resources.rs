//! Point operations on a single resource.

use tracing::debug;

use super::Testkit;
use crate::address::ResourceAddress;
use crate::error::{Result, TestkitError};
use crate::headers::Headers;
use crate::request::{DocumentRequest, DocumentResponse, OperationType};
use crate::resource::Resource;

impl Testkit {
    /// Send through the gateway path, attaching the empty partition key to partitioned kinds.
    pub(crate) async fn send(&self, mut request: DocumentRequest) -> Result<DocumentResponse> {
        request.ensure_partition_key();
        Ok(self.client.execute(request).await?)
    }

    pub async fn read<T: Resource>(
        &self,
        address: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
    ) -> Result<T> {
        let (resource, _) = self.read_with_headers(address, headers).await?;
        Ok(resource)
    }

    /// Read a resource and also return the response headers.
    pub async fn read_with_headers<T: Resource>(
        &self,
        address: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
    ) -> Result<(T, Headers)> {
        let request = DocumentRequest::new(OperationType::Read, T::KIND, address.into(), headers);
        let response = self.send(request).await?;
        Ok((response.resource()?, response.headers))
    }

    /// Re-read a stored resource by its rid, using its id as the partition key.
    pub async fn read_resource<T: Resource>(&self, resource: &T, headers: Option<&Headers>) -> Result<T> {
        let address = resource.rid_address().ok_or_else(|| {
            TestkitError::invalid_argument(format!("{} {} has not been stored", T::KIND, resource.id()))
        })?;
        let mut request = DocumentRequest::new(OperationType::Read, T::KIND, address, headers);
        if T::KIND.is_partitioned() {
            request.set_partition_key(&serde_json::to_string(&[resource.id()])?);
        }
        let response = self.send(request).await?;
        response.resource()
    }

    pub async fn read_with_retry<T: Resource>(
        &self,
        address: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
    ) -> Result<T> {
        let address = address.into();
        self.retry_transient(|| self.read::<T>(address.clone(), headers))
            .await
    }

    pub async fn read_resource_with_retry<T: Resource>(
        &self,
        resource: &T,
        headers: Option<&Headers>,
    ) -> Result<T> {
        self.retry_transient(|| self.read_resource(resource, headers))
            .await
    }

    /// Create `resource` under `parent` (the account root for databases).
    pub async fn create<T: Resource>(
        &self,
        parent: impl Into<ResourceAddress>,
        resource: &T,
        headers: Option<&Headers>,
    ) -> Result<T> {
        let request =
            DocumentRequest::with_resource(OperationType::Create, parent.into(), resource, headers)?;
        self.send(request).await?.resource()
    }

    /// Create `resource` under `parent`, or replace the one with the same id.
    pub async fn upsert<T: Resource>(
        &self,
        parent: impl Into<ResourceAddress>,
        resource: &T,
        headers: Option<&Headers>,
    ) -> Result<T> {
        let request =
            DocumentRequest::with_resource(OperationType::Upsert, parent.into(), resource, headers)?;
        self.send(request).await?.resource()
    }

    /// Replace a stored resource, addressed by its link or, failing that, its id.
    pub async fn update<T: Resource>(&self, resource: &T, headers: Option<&Headers>) -> Result<T> {
        let address = resource
            .link()
            .unwrap_or_else(|| ResourceAddress::parse(resource.id()));
        let request =
            DocumentRequest::with_resource(OperationType::Replace, address, resource, headers)?;
        self.send(request).await?.resource()
    }

    pub async fn replace<T: Resource>(&self, resource: &T) -> Result<T> {
        self.update(resource, None).await
    }

    /// Delete a resource. A missing resource is not an error: the returned
    /// response has status 404 and no body.
    pub async fn delete<T: Resource>(
        &self,
        address: impl Into<ResourceAddress>,
        headers: Option<&Headers>,
    ) -> Result<DocumentResponse> {
        let address = address.into();
        match self.delete_strict::<T>(address.clone(), headers).await {
            Err(TestkitError::Client(e)) if e.is_not_found() => {
                debug!(kind = %T::KIND, %address, "delete of missing resource");
                Ok(DocumentResponse::not_found())
            }
            other => other,
        }
    }

    /// Delete that surfaces not-found like any other failure.
    pub(crate) async fn delete_strict<T: Resource>(
        &self,
        address: ResourceAddress,
        headers: Option<&Headers>,
    ) -> Result<DocumentResponse> {
        let request = DocumentRequest::new(OperationType::Delete, T::KIND, address, headers);
        self.send(request).await
    }
}
