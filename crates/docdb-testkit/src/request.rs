//! Requests and responses exchanged over the client seam.

use serde::Deserialize;
use serde_json::Value;

use crate::address::ResourceAddress;
use crate::error::{status, Result, TestkitError};
use crate::headers::{names, Headers, EMPTY_PARTITION_KEY};
use crate::resource::{Resource, ResourceKind};
use crate::routing::PartitionKeyRangeIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Create,
    Read,
    ReadFeed,
    Replace,
    Upsert,
    Delete,
}

impl OperationType {
    /// HTTP verb the operation is sent (and signed) with.
    pub fn http_verb(self) -> &'static str {
        match self {
            OperationType::Create | OperationType::Upsert => "POST",
            OperationType::Read | OperationType::ReadFeed => "GET",
            OperationType::Replace => "PUT",
            OperationType::Delete => "DELETE",
        }
    }
}

/// One request against the service.
///
/// `address` names the target resource for point operations and the
/// container (parent) for `Create`, `Upsert` and `ReadFeed`.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    pub operation: OperationType,
    pub kind: ResourceKind,
    pub address: ResourceAddress,
    pub headers: Headers,
    pub body: Option<Value>,
    pub route: Option<PartitionKeyRangeIdentity>,
}

impl DocumentRequest {
    pub fn new(
        operation: OperationType,
        kind: ResourceKind,
        address: ResourceAddress,
        headers: Option<&Headers>,
    ) -> Self {
        Self {
            operation,
            kind,
            address,
            headers: headers.cloned().unwrap_or_default(),
            body: None,
            route: None,
        }
    }

    /// Request carrying a serialized resource body.
    pub fn with_resource<T: Resource>(
        operation: OperationType,
        address: ResourceAddress,
        resource: &T,
        headers: Option<&Headers>,
    ) -> Result<Self> {
        let body = serde_json::to_value(resource)?;
        Ok(Self::new(operation, T::KIND, address, headers).with_body(body))
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Bind the request to a specific partition-key range.
    pub fn route_to(&mut self, identity: PartitionKeyRangeIdentity) {
        self.route = Some(identity);
    }

    pub fn set_partition_key(&mut self, value: &str) {
        self.headers.insert(names::PARTITION_KEY, value);
    }

    /// Attach the empty partition key when the kind is partitioned and none was given.
    pub fn ensure_partition_key(&mut self) {
        if self.kind.is_partitioned() && !self.headers.contains(names::PARTITION_KEY) {
            self.set_partition_key(EMPTY_PARTITION_KEY);
        }
    }

    pub fn activity_id(&self) -> Option<&str> {
        self.headers.get(names::ACTIVITY_ID)
    }
}

/// Response of a successful request, or the synthesized benign not-found.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Option<Value>,
}

impl DocumentResponse {
    pub fn new(status: u16, headers: Headers, body: Option<Value>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// The response handed back when deleting something that does not exist.
    pub fn not_found() -> Self {
        Self::new(status::NOT_FOUND, Headers::new(), None)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == status::NOT_FOUND
    }

    pub fn continuation(&self) -> Option<&str> {
        self.headers.continuation()
    }

    /// Deserialize the body as a single resource.
    pub fn resource<T: Resource>(&self) -> Result<T> {
        let body = self.body.as_ref().ok_or_else(|| {
            TestkitError::invalid_argument(format!(
                "status {} response has no {} body",
                self.status,
                T::KIND
            ))
        })?;
        Ok(T::deserialize(body)?)
    }

    /// Deserialize the body as one page of a feed.
    pub fn feed<T: Resource>(&self) -> Result<FeedPage<T>> {
        let items = match self
            .body
            .as_ref()
            .and_then(|body| body.get(T::KIND.feed_key()))
        {
            Some(items) => Vec::<T>::deserialize(items)?,
            None => Vec::new(),
        };
        Ok(FeedPage {
            items,
            continuation: self.continuation().map(str::to_string),
            headers: self.headers.clone(),
        })
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage<T> {
    pub items: Vec<T>,
    /// Token for the next page; `None` when this was the last one.
    pub continuation: Option<String>,
    pub headers: Headers,
}

impl<T> FeedPage<T> {
    pub fn is_last(&self) -> bool {
        self.continuation.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Database, Document};
    use serde_json::json;

    #[test]
    fn verbs_follow_operation() {
        assert_eq!(OperationType::Create.http_verb(), "POST");
        assert_eq!(OperationType::ReadFeed.http_verb(), "GET");
        assert_eq!(OperationType::Replace.http_verb(), "PUT");
        assert_eq!(OperationType::Delete.http_verb(), "DELETE");
    }

    #[test]
    fn partitioned_kinds_get_empty_partition_key() {
        let mut req = DocumentRequest::new(
            OperationType::ReadFeed,
            ResourceKind::Document,
            ResourceAddress::collection("db", "c"),
            None,
        );
        req.ensure_partition_key();
        assert_eq!(req.headers.get(names::PARTITION_KEY), Some("[]"));

        let mut db = DocumentRequest::new(
            OperationType::ReadFeed,
            ResourceKind::Database,
            ResourceAddress::Root,
            None,
        );
        db.ensure_partition_key();
        assert!(!db.headers.contains(names::PARTITION_KEY));
    }

    #[test]
    fn feed_reads_items_and_continuation() {
        let mut headers = Headers::new();
        headers.set_continuation("7");
        let resp = DocumentResponse::new(
            200,
            headers,
            Some(json!({"Databases": [{"id": "a", "_rid": "r1"}, {"id": "b"}], "_count": 2})),
        );
        let page = resp.feed::<Database>().unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].system.rid.as_deref(), Some("r1"));
        assert_eq!(page.continuation.as_deref(), Some("7"));
        assert!(!page.is_last());
    }

    #[test]
    fn resource_request_carries_serialized_body() {
        let request = DocumentRequest::with_resource(
            OperationType::Create,
            ResourceAddress::Root,
            &Database::new("db1"),
            None,
        )
        .unwrap();
        assert_eq!(request.kind, ResourceKind::Database);
        assert_eq!(request.body.as_ref().unwrap()["id"], "db1");

        let raw = DocumentRequest::new(
            OperationType::Replace,
            ResourceKind::Database,
            ResourceAddress::database("db1"),
            None,
        )
        .with_body(json!({"id": "db1", "extra": 1}));
        assert_eq!(raw.body, Some(json!({"id": "db1", "extra": 1})));
    }

    #[test]
    fn missing_body_is_an_error() {
        let err = DocumentResponse::not_found().resource::<Document>().unwrap_err();
        assert!(matches!(err, TestkitError::InvalidArgument(_)));
    }
}
