//! Integration tests: create-or-get fixtures, data sets and environment helpers.

mod common;

use std::collections::BTreeSet;

use docdb_testkit::resource::{Database, Document, Resource};
use docdb_testkit::testkit::{DATA_SET_CHUNK, DATA_SET_PARTITION_KEY_PATH};
use docdb_testkit::ResourceAddress;

#[tokio::test]
async fn create_or_get_reuses_existing_resources() {
    let (tk, _emu) = common::start().await;
    let first = tk.create_or_get_database().await.unwrap();
    let second = tk.create_or_get_database().await.unwrap();
    assert_eq!(first.resource_id(), second.resource_id());

    let (coll_a, db_a) = tk.create_or_get_collection().await.unwrap();
    let (coll_b, db_b) = tk.create_or_get_collection().await.unwrap();
    assert_eq!(db_a.resource_id(), first.resource_id());
    assert_eq!(db_b.resource_id(), first.resource_id());
    assert_eq!(coll_a.resource_id(), coll_b.resource_id());

    let (doc_a, _, _) = tk.create_or_get_document().await.unwrap();
    let (doc_b, coll, _) = tk.create_or_get_document().await.unwrap();
    assert_eq!(doc_a.resource_id(), doc_b.resource_id());
    assert_eq!(coll.resource_id(), coll_a.resource_id());

    let (user_a, _) = tk.create_or_get_user().await.unwrap();
    let (user_b, _) = tk.create_or_get_user().await.unwrap();
    assert_eq!(user_a.resource_id(), user_b.resource_id());
}

#[tokio::test]
async fn fixture_collection_gets_its_own_offer() {
    let (tk, _emu) = common::start().await;
    let (coll, _) = tk.create_or_get_collection().await.unwrap();
    let offer_type = tk
        .collection_offer_type(coll.resource_id().unwrap())
        .await
        .unwrap();
    assert_eq!(offer_type.as_deref(), Some("Invalid"));
    assert_eq!(tk.collection_offer_type("unknown").await.unwrap(), None);
}

#[tokio::test]
async fn upserts_add_new_resources() {
    let (tk, _emu) = common::start().await;
    let (user, db) = tk.upsert_user().await.unwrap();
    assert!(user.resource_id().is_some());
    let (doc, coll, db_again) = tk.upsert_document().await.unwrap();
    assert_eq!(db_again.resource_id(), db.resource_id());
    assert!(doc.resource_id().is_some());
    let docs = tk
        .list_all::<Document>(coll.self_link().unwrap(), None, false)
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
}

#[tokio::test]
async fn named_and_random_databases() {
    let (tk, _emu) = common::start().await;
    let named = tk.create_database(Some("named")).await.unwrap();
    assert_eq!(named.id, "named");
    let random = tk.create_database(None).await.unwrap();
    assert_eq!(random.id.len(), 32);
    let blank = tk.create_database(Some("  ")).await.unwrap();
    assert_ne!(blank.id.trim(), "");
}

#[tokio::test]
async fn data_set_creates_every_document() {
    let (tk, _emu) = common::start().await;
    let total = 2 * DATA_SET_CHUNK + 50;
    let coll = tk.create_data_set("ds", "items", total, 10_000).await.unwrap();
    assert_eq!(
        coll.partition_key.as_ref().unwrap().paths,
        vec![DATA_SET_PARTITION_KEY_PATH.to_string()]
    );

    let docs = tk
        .list_all::<Document>(ResourceAddress::collection("ds", "items"), None, false)
        .await
        .unwrap();
    assert_eq!(docs.len(), total);
    let ids: BTreeSet<_> = docs.iter().map(|d| d.id.clone()).collect();
    assert_eq!(ids.len(), total);
    assert!(ids.contains("documentId0"));
    assert!(ids.contains(&format!("documentId{}", total - 1)));
    assert!(docs.iter().all(|d| d.get("field_19").is_some()));

    let db: Database = tk.read(ResourceAddress::database("ds"), None).await.unwrap();
    assert_eq!(db.id, "ds");
}

#[tokio::test]
async fn configuration_setters_are_accepted() {
    let (tk, _emu) = common::start().await;
    tk.set_configuration_property("enableFeature", true).await;
    tk.set_federation_wide_configuration_property("maxItems", 10i64).await;
    tk.wait_for_config_refresh().await;
    tk.wait_for_backend_config_refresh().await;
    tk.wait_for_master_replication().await;
    tk.wait_while_backend_operation_commits().await;
}
