//! Request semantics of the emulator, one function per operation.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteConnection;
use tracing::debug;

use super::partitioning::{effective_partition_key, split_ranges};
use super::store::{self, NewResource, StoredResource, ROOT_RID};
use crate::address::ResourceAddress;
use crate::config::EmulatorConfig;
use crate::error::{status, ClientError, SUB_STATUS_PARTITION_KEY_RANGE_GONE};
use crate::headers::{names, Headers};
use crate::request::{DocumentRequest, DocumentResponse, OperationType};
use crate::resource::{Offer, OfferContent, ResourceKind};

type HandlerResult<T> = std::result::Result<T, ClientError>;

/// What an address resolved to.
#[derive(Debug, Clone)]
pub(crate) enum Located {
    Root,
    Resource(StoredResource),
}

impl Located {
    pub(crate) fn rid(&self) -> &str {
        match self {
            Located::Root => ROOT_RID,
            Located::Resource(r) => &r.rid,
        }
    }

    fn kind(&self) -> Option<ResourceKind> {
        match self {
            Located::Root => None,
            Located::Resource(r) => Some(r.kind),
        }
    }

    fn self_link(&self) -> &str {
        match self {
            Located::Root => "",
            Located::Resource(r) => &r.self_link,
        }
    }

    fn describe(&self) -> String {
        match self {
            Located::Root => "the account".to_string(),
            Located::Resource(r) => format!("{} {}", r.kind, r.id),
        }
    }
}

/// Resolve an address by rid or by walking a name path.
///
/// Path segments may name a resource by its id or by its rid, so self links
/// resolve the same way as name paths.
pub(crate) async fn locate(
    conn: &mut SqliteConnection,
    address: &ResourceAddress,
) -> HandlerResult<Located> {
    match address {
        ResourceAddress::Root => Ok(Located::Root),
        ResourceAddress::Rid(rid) => store::find_by_rid(conn, rid)
            .await?
            .map(Located::Resource)
            .ok_or_else(|| ClientError::not_found(format!("resource {rid} does not exist"))),
        ResourceAddress::Path(_) => {
            let segments = address.segments();
            if segments.len() % 2 != 0 {
                return Err(ClientError::bad_request(format!("malformed address {address}")));
            }
            let mut parent_rid = ROOT_RID.to_string();
            let mut found = None;
            for pair in segments.chunks(2) {
                let kind = ResourceKind::from_path_segment(pair[0]).ok_or_else(|| {
                    ClientError::bad_request(format!("unknown path segment {}", pair[0]))
                })?;
                let name = pair[1];
                let by_id = store::find_child(conn, &parent_rid, kind, name).await?;
                let resource = match by_id {
                    Some(r) => Some(r),
                    None => store::find_by_rid(conn, name)
                        .await?
                        .filter(|r| r.kind == kind && r.parent_rid == parent_rid),
                };
                let resource = resource.ok_or_else(|| {
                    ClientError::not_found(format!("{address} does not exist"))
                })?;
                parent_rid = resource.rid.clone();
                found = Some(resource);
            }
            found
                .map(Located::Resource)
                .ok_or_else(|| ClientError::bad_request("empty address"))
        }
    }
}

pub(crate) async fn handle(
    conn: &mut SqliteConnection,
    config: &EmulatorConfig,
    request: &DocumentRequest,
) -> HandlerResult<DocumentResponse> {
    if let Some(route) = &request.route {
        let known = store::ranges_for(conn, &route.collection_rid)
            .await?
            .into_iter()
            .any(|r| r.id == route.range_id);
        if !known {
            return Err(ClientError::gone().with_sub_status(SUB_STATUS_PARTITION_KEY_RANGE_GONE));
        }
    }
    match request.operation {
        OperationType::Create => create(conn, config, request).await,
        OperationType::Read => read(conn, request).await,
        OperationType::ReadFeed => read_feed(conn, config, request).await,
        OperationType::Replace => replace(conn, request).await,
        OperationType::Upsert => upsert(conn, config, request).await,
        OperationType::Delete => delete(conn, request).await,
    }
}

async fn create(
    conn: &mut SqliteConnection,
    config: &EmulatorConfig,
    request: &DocumentRequest,
) -> HandlerResult<DocumentResponse> {
    let parent = locate(conn, &request.address).await?;
    check_parent(&parent, request.kind)?;
    let body = request_body(request)?;
    let created = create_under(conn, config, &parent, request.kind, body, &request.headers).await?;
    Ok(resource_response(status::CREATED, created))
}

async fn read(conn: &mut SqliteConnection, request: &DocumentRequest) -> HandlerResult<DocumentResponse> {
    let target = locate_target(conn, request).await?;
    Ok(resource_response(status::OK, target.body))
}

async fn replace(
    conn: &mut SqliteConnection,
    request: &DocumentRequest,
) -> HandlerResult<DocumentResponse> {
    let target = locate_target(conn, request).await?;
    let body = request_body(request)?;
    let replaced = replace_existing(conn, &target, body).await?;
    Ok(resource_response(status::OK, replaced))
}

async fn upsert(
    conn: &mut SqliteConnection,
    config: &EmulatorConfig,
    request: &DocumentRequest,
) -> HandlerResult<DocumentResponse> {
    let parent = locate(conn, &request.address).await?;
    check_parent(&parent, request.kind)?;
    let body = request_body(request)?;
    let id = body_id(&body)?;
    match store::find_child(conn, parent.rid(), request.kind, &id).await? {
        Some(existing) => {
            let replaced = replace_existing(conn, &existing, body).await?;
            Ok(resource_response(status::OK, replaced))
        }
        None => {
            let created =
                create_under(conn, config, &parent, request.kind, body, &request.headers).await?;
            Ok(resource_response(status::CREATED, created))
        }
    }
}

async fn delete(
    conn: &mut SqliteConnection,
    request: &DocumentRequest,
) -> HandlerResult<DocumentResponse> {
    let target = locate_target(conn, request).await?;
    let removed = store::delete_cascade(conn, &target.rid).await?;
    debug!(kind = %target.kind, id = %target.id, removed, "deleted resource");
    Ok(DocumentResponse::new(status::NO_CONTENT, Headers::new(), None))
}

async fn read_feed(
    conn: &mut SqliteConnection,
    config: &EmulatorConfig,
    request: &DocumentRequest,
) -> HandlerResult<DocumentResponse> {
    let container = locate(conn, &request.address).await?;
    let kind = request.kind;

    if kind == ResourceKind::PartitionKeyRange {
        if container.kind() != Some(ResourceKind::Collection) {
            return Err(ClientError::bad_request("partition key ranges live under a collection"));
        }
        let ranges = store::ranges_for(conn, container.rid()).await?;
        let items = ranges
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ClientError::internal(e.to_string()))?;
        return Ok(feed_response(container.rid(), kind, items, None));
    }

    check_parent(&container, kind)?;

    let page_size = request
        .headers
        .get(names::MAX_ITEM_COUNT)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map_or(config.page_size.max(1), |n| n.min(i64::from(u32::MAX)) as u32);
    let after_seq = match request.headers.continuation() {
        Some(token) => token
            .parse::<i64>()
            .map_err(|_| ClientError::bad_request(format!("invalid continuation {token}")))?,
        None => 0,
    };

    let bounds = match (&request.route, kind.is_partitioned()) {
        (Some(route), true) => store::ranges_for(conn, container.rid())
            .await?
            .into_iter()
            .find(|r| r.id == route.range_id)
            .map(|r| (r.min_inclusive, r.max_exclusive))
            .ok_or_else(|| {
                ClientError::gone().with_sub_status(SUB_STATUS_PARTITION_KEY_RANGE_GONE)
            })
            .map(Some)?,
        _ => None,
    };

    let mut rows = store::list_children(
        conn,
        container.rid(),
        kind,
        after_seq,
        page_size.saturating_add(1),
        bounds.as_ref().map(|(min, max)| (min.as_str(), max.as_str())),
    )
    .await?;
    let has_more = rows.len() > page_size as usize;
    rows.truncate(page_size as usize);
    let continuation = if has_more {
        rows.last().map(|r| r.seq.to_string())
    } else {
        None
    };
    let items = rows.into_iter().map(|r| r.body).collect();
    Ok(feed_response(container.rid(), kind, items, continuation))
}

async fn locate_target(
    conn: &mut SqliteConnection,
    request: &DocumentRequest,
) -> HandlerResult<StoredResource> {
    match locate(conn, &request.address).await? {
        Located::Resource(r) if r.kind == request.kind => Ok(r),
        Located::Resource(r) => Err(ClientError::not_found(format!(
            "{} is a {}, not a {}",
            request.address, r.kind, request.kind
        ))),
        Located::Root => Err(ClientError::new(
            status::METHOD_NOT_ALLOWED,
            "the account is not a resource",
        )),
    }
}

fn check_parent(parent: &Located, kind: ResourceKind) -> HandlerResult<()> {
    if kind == ResourceKind::PartitionKeyRange {
        return Err(ClientError::new(
            status::METHOD_NOT_ALLOWED,
            "partition key ranges are managed by the service",
        ));
    }
    if parent.kind() != kind.parent_kind() {
        return Err(ClientError::bad_request(format!(
            "{kind} cannot live under {}",
            parent.describe()
        )));
    }
    Ok(())
}

fn request_body(request: &DocumentRequest) -> HandlerResult<Value> {
    match &request.body {
        Some(body @ Value::Object(_)) => Ok(body.clone()),
        Some(_) => Err(ClientError::bad_request("request body must be a JSON object")),
        None => Err(ClientError::bad_request("request body is required")),
    }
}

fn body_id(body: &Value) -> HandlerResult<String> {
    body.get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ClientError::bad_request("the resource id is required"))
}

async fn create_under(
    conn: &mut SqliteConnection,
    config: &EmulatorConfig,
    parent: &Located,
    kind: ResourceKind,
    body: Value,
    headers: &Headers,
) -> HandlerResult<Value> {
    let id = body_id(&body)?;
    let rid = new_rid();
    let self_link = format!("{}{}/{}/", parent.self_link(), kind.path_segment(), rid);
    let epk = match (kind, parent) {
        (ResourceKind::Document, Located::Resource(collection)) => {
            Some(document_epk(collection, &body))
        }
        _ => None,
    };
    let ts = unix_timestamp();
    let (body, etag) = stamp(body, &rid, &self_link, ts)?;
    store::insert(
        conn,
        &NewResource {
            rid: &rid,
            kind,
            id: &id,
            parent_rid: parent.rid(),
            owner_rid: None,
            self_link: &self_link,
            epk: epk.as_deref(),
            body: &body,
            etag: &etag,
            ts,
        },
    )
    .await?;

    if kind == ResourceKind::Collection {
        store::insert_ranges(conn, &rid, &split_ranges(config.partitions_per_collection)).await?;
        let throughput = headers
            .get(names::OFFER_THROUGHPUT)
            .and_then(|t| t.parse::<i64>().ok())
            .unwrap_or(config.default_offer_throughput);
        create_offer(conn, &rid, &self_link, throughput, ts).await?;
    }
    debug!(%kind, %id, %rid, "created resource");
    Ok(body)
}

async fn create_offer(
    conn: &mut SqliteConnection,
    collection_rid: &str,
    collection_link: &str,
    throughput: i64,
    ts: i64,
) -> HandlerResult<()> {
    let rid = new_rid();
    let self_link = format!("{}/{}/", ResourceKind::Offer.path_segment(), rid);
    let offer = Offer {
        id: rid.clone(),
        offer_type: "Invalid".to_string(),
        offer_version: "V2".to_string(),
        offer_resource_id: collection_rid.to_string(),
        resource: collection_link.to_string(),
        content: Some(OfferContent {
            offer_throughput: throughput,
        }),
        ..Offer::default()
    };
    let body = serde_json::to_value(&offer).map_err(|e| ClientError::internal(e.to_string()))?;
    let (body, etag) = stamp(body, &rid, &self_link, ts)?;
    store::insert(
        conn,
        &NewResource {
            rid: &rid,
            kind: ResourceKind::Offer,
            id: &rid,
            parent_rid: ROOT_RID,
            owner_rid: Some(collection_rid),
            self_link: &self_link,
            epk: None,
            body: &body,
            etag: &etag,
            ts,
        },
    )
    .await?;
    Ok(())
}

async fn replace_existing(
    conn: &mut SqliteConnection,
    existing: &StoredResource,
    body: Value,
) -> HandlerResult<Value> {
    let id = body_id(&body)?;
    let epk = if existing.kind == ResourceKind::Document {
        let collection = store::find_by_rid(conn, &existing.parent_rid)
            .await?
            .ok_or_else(|| ClientError::not_found("owning collection does not exist"))?;
        Some(document_epk(&collection, &body))
    } else {
        None
    };
    let ts = unix_timestamp();
    let (body, etag) = stamp(body, &existing.rid, &existing.self_link, ts)?;
    store::update(conn, &existing.rid, &id, epk.as_deref(), &body, &etag, ts).await?;
    Ok(body)
}

/// Hash the value at the collection's partition key path; absent values hash as null.
fn document_epk(collection: &StoredResource, document: &Value) -> String {
    let value = collection
        .body
        .pointer("/partitionKey/paths/0")
        .and_then(Value::as_str)
        .and_then(|path| document.pointer(path))
        .cloned()
        .unwrap_or(Value::Null);
    effective_partition_key(&value)
}

/// Write the system properties into `body` and compute its etag.
fn stamp(body: Value, rid: &str, self_link: &str, ts: i64) -> HandlerResult<(Value, String)> {
    let Value::Object(mut map) = body else {
        return Err(ClientError::bad_request("request body must be a JSON object"));
    };
    map.insert("_rid".into(), json!(rid));
    map.insert("_self".into(), json!(self_link));
    map.insert("_ts".into(), json!(ts));
    map.remove("_etag");
    let digest = Sha256::digest(Value::Object(map.clone()).to_string().as_bytes());
    let etag = format!("\"{}\"", &hex::encode(digest)[..16]);
    map.insert("_etag".into(), json!(etag));
    Ok((Value::Object(map), etag))
}

fn resource_response(status: u16, body: Value) -> DocumentResponse {
    let mut headers = Headers::new();
    if let Some(etag) = body.get("_etag").and_then(Value::as_str) {
        headers.insert("etag", etag);
    }
    DocumentResponse::new(status, headers, Some(body))
}

fn feed_response(
    container_rid: &str,
    kind: ResourceKind,
    items: Vec<Value>,
    continuation: Option<String>,
) -> DocumentResponse {
    let mut headers = Headers::new();
    headers.insert(names::ITEM_COUNT, items.len().to_string());
    if let Some(token) = continuation {
        headers.set_continuation(token);
    }
    let mut body = Map::new();
    body.insert("_rid".into(), json!(container_rid));
    body.insert("_count".into(), json!(items.len()));
    body.insert(kind.feed_key().into(), Value::Array(items));
    DocumentResponse::new(status::OK, headers, Some(Value::Object(body)))
}

fn new_rid() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_sets_system_properties() {
        let (body, etag) = stamp(json!({"id": "a", "_etag": "old"}), "RID", "dbs/RID/", 5).unwrap();
        assert_eq!(body["_rid"], "RID");
        assert_eq!(body["_self"], "dbs/RID/");
        assert_eq!(body["_ts"], 5);
        assert_eq!(body["_etag"], json!(etag));
        assert_ne!(etag, "old");
    }

    #[test]
    fn stamp_rejects_non_objects() {
        assert_eq!(stamp(json!([1]), "r", "s", 0).unwrap_err().status, 400);
    }

    #[test]
    fn rids_are_single_path_tokens() {
        for _ in 0..100 {
            let rid = new_rid();
            assert_eq!(rid.len(), 11);
            assert!(!rid.contains('/'));
            assert!(matches!(ResourceAddress::parse(&rid), ResourceAddress::Rid(_)));
        }
    }

    #[test]
    fn document_epk_reads_partition_key_path() {
        let collection = StoredResource {
            seq: 1,
            rid: "c".into(),
            kind: ResourceKind::Collection,
            id: "c".into(),
            parent_rid: "d".into(),
            owner_rid: None,
            self_link: "dbs/d/colls/c/".into(),
            epk: None,
            body: json!({"id": "c", "partitionKey": {"paths": ["/partitionKey"], "kind": "Hash"}}),
        };
        let a = document_epk(&collection, &json!({"id": "x", "partitionKey": 1}));
        let b = document_epk(&collection, &json!({"id": "y", "partitionKey": 1}));
        let c = document_epk(&collection, &json!({"id": "z"}));
        assert_eq!(a, b);
        assert_eq!(a, effective_partition_key(&json!(1)));
        assert_eq!(c, effective_partition_key(&Value::Null));
    }
}
