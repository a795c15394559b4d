//! SQLite persistence for emulated resources.
//!
//! Every resource is one row keyed by rid, with its parent's rid (empty for
//! top-level resources), its kind and user id. Documents also carry their
//! effective partition key so routed feeds can filter by range. Offers
//! point at the collection they provision through `owner_rid`.

use std::path::Path;

use serde_json::Value;
use sqlx::sqlite::{SqliteConnection, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};

use crate::error::{ClientError, Result};
use crate::resource::{PartitionKeyRange, ResourceKind};

/// Rid of the account root, parent of databases and offers.
pub(crate) const ROOT_RID: &str = "";

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Single-connection pool; requests are serialized on it.
pub(crate) async fn open_memory() -> Result<Pool<Sqlite>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Open (or create) a file-backed store. Creates parent dirs if needed.
pub(crate) async fn open_at(path: &Path) -> Result<Pool<Sqlite>> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let uri = path_to_sqlite_uri(path) + "?mode=rwc";
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&uri)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resources (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            rid TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            id TEXT NOT NULL,
            parent_rid TEXT NOT NULL,
            owner_rid TEXT,
            self_link TEXT NOT NULL,
            epk TEXT,
            body TEXT NOT NULL,
            etag TEXT NOT NULL,
            ts INTEGER NOT NULL,
            UNIQUE (parent_rid, kind, id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS partition_key_ranges (
            collection_rid TEXT NOT NULL,
            range_id TEXT NOT NULL,
            min_inclusive TEXT NOT NULL,
            max_exclusive TEXT NOT NULL,
            PRIMARY KEY (collection_rid, range_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Map a storage failure onto the error the client seam reports.
pub(crate) fn storage_error(e: sqlx::Error) -> ClientError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ClientError::conflict("resource with the specified id already exists")
        }
        _ => ClientError::internal(format!("storage: {e}")),
    }
}

/// One stored resource row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredResource {
    pub seq: i64,
    pub rid: String,
    pub kind: ResourceKind,
    pub id: String,
    pub parent_rid: String,
    pub owner_rid: Option<String>,
    pub self_link: String,
    pub epk: Option<String>,
    pub body: Value,
}

impl StoredResource {
    fn from_row(row: &SqliteRow) -> std::result::Result<Self, ClientError> {
        let kind: String = row.try_get("kind").map_err(storage_error)?;
        let body: String = row.try_get("body").map_err(storage_error)?;
        Ok(Self {
            seq: row.try_get("seq").map_err(storage_error)?,
            rid: row.try_get("rid").map_err(storage_error)?,
            kind: ResourceKind::from_path_segment(&kind)
                .ok_or_else(|| ClientError::internal(format!("unknown stored kind {kind}")))?,
            id: row.try_get("id").map_err(storage_error)?,
            parent_rid: row.try_get("parent_rid").map_err(storage_error)?,
            owner_rid: row.try_get("owner_rid").map_err(storage_error)?,
            self_link: row.try_get("self_link").map_err(storage_error)?,
            epk: row.try_get("epk").map_err(storage_error)?,
            body: serde_json::from_str(&body)
                .map_err(|e| ClientError::internal(format!("stored body: {e}")))?,
        })
    }
}

/// Row to insert; system properties are already stamped into `body`.
#[derive(Debug, Clone)]
pub(crate) struct NewResource<'a> {
    pub rid: &'a str,
    pub kind: ResourceKind,
    pub id: &'a str,
    pub parent_rid: &'a str,
    pub owner_rid: Option<&'a str>,
    pub self_link: &'a str,
    pub epk: Option<&'a str>,
    pub body: &'a Value,
    pub etag: &'a str,
    pub ts: i64,
}

type StoreResult<T> = std::result::Result<T, ClientError>;

const COLUMNS: &str = "seq, rid, kind, id, parent_rid, owner_rid, self_link, epk, body";

pub(crate) async fn find_by_rid(
    conn: &mut SqliteConnection,
    rid: &str,
) -> StoreResult<Option<StoredResource>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM resources WHERE rid = ?1"))
        .bind(rid)
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage_error)?;
    row.as_ref().map(StoredResource::from_row).transpose()
}

pub(crate) async fn find_child(
    conn: &mut SqliteConnection,
    parent_rid: &str,
    kind: ResourceKind,
    id: &str,
) -> StoreResult<Option<StoredResource>> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM resources WHERE parent_rid = ?1 AND kind = ?2 AND id = ?3"
    ))
    .bind(parent_rid)
    .bind(kind.path_segment())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(storage_error)?;
    row.as_ref().map(StoredResource::from_row).transpose()
}

pub(crate) async fn insert(conn: &mut SqliteConnection, new: &NewResource<'_>) -> StoreResult<i64> {
    let seq = sqlx::query(
        r#"
        INSERT INTO resources (rid, kind, id, parent_rid, owner_rid, self_link, epk, body, etag, ts)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(new.rid)
    .bind(new.kind.path_segment())
    .bind(new.id)
    .bind(new.parent_rid)
    .bind(new.owner_rid)
    .bind(new.self_link)
    .bind(new.epk)
    .bind(new.body.to_string())
    .bind(new.etag)
    .bind(new.ts)
    .execute(&mut *conn)
    .await
    .map_err(storage_error)?
    .last_insert_rowid();
    Ok(seq)
}

/// Replace the user-visible part of a stored resource.
pub(crate) async fn update(
    conn: &mut SqliteConnection,
    rid: &str,
    id: &str,
    epk: Option<&str>,
    body: &Value,
    etag: &str,
    ts: i64,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        UPDATE resources
        SET id = ?1, epk = ?2, body = ?3, etag = ?4, ts = ?5
        WHERE rid = ?6
        "#,
    )
    .bind(id)
    .bind(epk)
    .bind(body.to_string())
    .bind(etag)
    .bind(ts)
    .bind(rid)
    .execute(&mut *conn)
    .await
    .map_err(storage_error)?;
    Ok(())
}

/// Children of `parent_rid` of one kind, in creation order, after `after_seq`.
///
/// `epk_bounds` restricts documents to `[min, max)`.
pub(crate) async fn list_children(
    conn: &mut SqliteConnection,
    parent_rid: &str,
    kind: ResourceKind,
    after_seq: i64,
    limit: u32,
    epk_bounds: Option<(&str, &str)>,
) -> StoreResult<Vec<StoredResource>> {
    let (min, max) = epk_bounds.unwrap_or(("", ""));
    let rows = sqlx::query(&format!(
        r#"
        SELECT {COLUMNS} FROM resources
        WHERE parent_rid = ?1 AND kind = ?2 AND seq > ?3
          AND (?4 = 0 OR (epk >= ?5 AND epk < ?6))
        ORDER BY seq ASC
        LIMIT ?7
        "#
    ))
    .bind(parent_rid)
    .bind(kind.path_segment())
    .bind(after_seq)
    .bind(i64::from(epk_bounds.is_some()))
    .bind(min)
    .bind(max)
    .bind(i64::from(limit))
    .fetch_all(&mut *conn)
    .await
    .map_err(storage_error)?;
    rows.iter().map(StoredResource::from_row).collect()
}

/// Delete a resource with everything beneath it, the offers of anything
/// deleted and the partition key ranges of deleted collections.
/// Returns the number of resource rows removed.
pub(crate) async fn delete_cascade(conn: &mut SqliteConnection, rid: &str) -> StoreResult<u64> {
    const DOOMED: &str = r#"
        WITH RECURSIVE doomed(rid) AS (
            SELECT ?1
            UNION ALL
            SELECT r.rid FROM resources r JOIN doomed d ON r.parent_rid = d.rid
        )
    "#;

    sqlx::query(&format!(
        "{DOOMED} DELETE FROM partition_key_ranges WHERE collection_rid IN (SELECT rid FROM doomed)"
    ))
    .bind(rid)
    .execute(&mut *conn)
    .await
    .map_err(storage_error)?;

    let removed = sqlx::query(&format!(
        "{DOOMED} DELETE FROM resources \
         WHERE rid IN (SELECT rid FROM doomed) OR owner_rid IN (SELECT rid FROM doomed)"
    ))
    .bind(rid)
    .execute(&mut *conn)
    .await
    .map_err(storage_error)?
    .rows_affected();
    Ok(removed)
}

pub(crate) async fn insert_ranges(
    conn: &mut SqliteConnection,
    collection_rid: &str,
    bounds: &[(String, String)],
) -> StoreResult<()> {
    for (idx, (min, max)) in bounds.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO partition_key_ranges (collection_rid, range_id, min_inclusive, max_exclusive)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(collection_rid)
        .bind(idx.to_string())
        .bind(min)
        .bind(max)
        .execute(&mut *conn)
        .await
        .map_err(storage_error)?;
    }
    Ok(())
}

/// Ranges of a collection ordered by their lower bound.
pub(crate) async fn ranges_for(
    conn: &mut SqliteConnection,
    collection_rid: &str,
) -> StoreResult<Vec<PartitionKeyRange>> {
    let rows = sqlx::query(
        r#"
        SELECT range_id, min_inclusive, max_exclusive FROM partition_key_ranges
        WHERE collection_rid = ?1
        ORDER BY min_inclusive ASC
        "#,
    )
    .bind(collection_rid)
    .fetch_all(&mut *conn)
    .await
    .map_err(storage_error)?;
    rows.iter()
        .map(|row| {
            let id: String = row.try_get("range_id").map_err(storage_error)?;
            let min: String = row.try_get("min_inclusive").map_err(storage_error)?;
            let max: String = row.try_get("max_exclusive").map_err(storage_error)?;
            Ok(PartitionKeyRange::new(id, min, max))
        })
        .collect()
}
