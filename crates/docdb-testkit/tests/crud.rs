//! Integration tests: resource helpers against the in-memory emulator.

mod common;

use docdb_testkit::assertions::assert_client_error;
use docdb_testkit::request::OperationType;
use docdb_testkit::resource::{Collection, Database, Document, Resource, ResourceKind, User};
use docdb_testkit::ResourceAddress;

#[tokio::test]
async fn create_then_read_by_name_and_by_rid() {
    let (tk, _emu) = common::start().await;
    let db = tk
        .create(ResourceAddress::Root, &Database::new("db1"), None)
        .await
        .unwrap();
    assert!(db.resource_id().is_some());
    assert!(db.self_link().is_some());

    let by_name: Database = tk.read(ResourceAddress::database("db1"), None).await.unwrap();
    assert_eq!(by_name, db);
    let by_rid = tk.read_resource(&db, None).await.unwrap();
    assert_eq!(by_rid, db);
}

#[tokio::test]
async fn duplicate_create_is_a_conflict_with_activity_id() {
    let (tk, _emu) = common::start().await;
    tk.create(ResourceAddress::Root, &Database::new("dup"), None)
        .await
        .unwrap();
    let err = tk
        .create(ResourceAddress::Root, &Database::new("dup"), None)
        .await
        .unwrap_err();
    let client = err.as_client_error().expect("client error");
    assert_client_error(client, &[409]);
}

#[tokio::test]
async fn delete_of_missing_resource_is_a_benign_not_found() {
    let (tk, _emu) = common::start().await;
    let resp = tk
        .delete::<Database>(ResourceAddress::database("never-created"), None)
        .await
        .unwrap();
    assert!(resp.is_not_found());

    let db = tk
        .create(ResourceAddress::Root, &Database::new("gone-soon"), None)
        .await
        .unwrap();
    let resp = tk.delete::<Database>(db.link().unwrap(), None).await.unwrap();
    assert_eq!(resp.status, 204);
    let resp = tk.delete::<Database>(db.link().unwrap(), None).await.unwrap();
    assert!(resp.is_not_found());
}

#[tokio::test]
async fn update_replaces_document_body() {
    let (tk, _emu) = common::start().await;
    tk.create(ResourceAddress::Root, &Database::new("db"), None)
        .await
        .unwrap();
    tk.create(ResourceAddress::database("db"), &Collection::new("coll"), None)
        .await
        .unwrap();
    let doc = tk
        .create(
            ResourceAddress::collection("db", "coll"),
            &Document::new("d1").with_property("n", 1),
            None,
        )
        .await
        .unwrap();

    let changed = doc.clone().with_property("n", 2);
    let updated = tk.update(&changed, None).await.unwrap();
    assert_eq!(updated.get("n"), Some(&serde_json::json!(2)));
    assert_eq!(updated.resource_id(), doc.resource_id());

    let read: Document = tk
        .read(ResourceAddress::document("db", "coll", "d1"), None)
        .await
        .unwrap();
    assert_eq!(read.get("n"), Some(&serde_json::json!(2)));
}

#[tokio::test]
async fn replace_of_missing_resource_is_not_found() {
    let (tk, _emu) = common::start().await;
    let err = tk.replace(&Database::new("absent")).await.unwrap_err();
    assert!(err.as_client_error().unwrap().is_not_found());
}

#[tokio::test]
async fn upsert_creates_then_replaces() {
    let (tk, emu) = common::start().await;
    let db = tk
        .create(ResourceAddress::Root, &Database::new("db"), None)
        .await
        .unwrap();
    let first = tk
        .upsert(db.link().unwrap(), &User::new("alice"), None)
        .await
        .unwrap();
    let second = tk
        .upsert(db.link().unwrap(), &User::new("alice"), None)
        .await
        .unwrap();
    assert_eq!(first.resource_id(), second.resource_id());

    let upserts: Vec<_> = emu
        .request_log()
        .into_iter()
        .filter(|r| r.operation == OperationType::Upsert && r.kind == ResourceKind::User)
        .map(|r| r.status)
        .collect();
    assert_eq!(upserts, vec![201, 200]);
}

#[tokio::test]
async fn deleting_a_database_cascades_to_collections() {
    let (tk, _emu) = common::start().await;
    let db = tk
        .create(ResourceAddress::Root, &Database::new("db"), None)
        .await
        .unwrap();
    let coll = tk
        .create(db.link().unwrap(), &Collection::new("coll"), None)
        .await
        .unwrap();
    tk.delete::<Database>(db.link().unwrap(), None).await.unwrap();
    let resp = tk.delete::<Collection>(coll.link().unwrap(), None).await.unwrap();
    assert!(resp.is_not_found());
}
