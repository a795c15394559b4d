//! Integration tests: signed store-path helpers for scripts.

mod common;

use docdb_testkit::request::{DocumentRequest, OperationType};
use docdb_testkit::resource::{Collection, ResourceKind, StoredProcedure};
use docdb_testkit::ResourceAddress;

async fn collection(tk: &docdb_testkit::Testkit) -> Collection {
    let db = tk.create_database(Some("db")).await.unwrap();
    tk.create_collection(&db, &Collection::new("coll"), None)
        .await
        .unwrap()
}

#[tokio::test]
async fn script_lifecycle_over_the_direct_path() {
    let (tk, emu) = common::start().await;
    let coll = collection(&tk).await;
    let link = coll.system.self_link.clone().unwrap();

    let created = tk
        .create_script_direct(link.as_str(), &StoredProcedure::new("sp1", "function() {}"))
        .await
        .unwrap();
    assert!(created.system.rid.is_some());

    let mut changed = created.clone();
    changed.body = "function() { return 1; }".into();
    let updated = tk.update_script_direct(&changed).await.unwrap();
    assert_eq!(updated.body, changed.body);

    tk.create_script_direct(link.as_str(), &StoredProcedure::new("sp2", "function() {}"))
        .await
        .unwrap();
    let scripts = tk
        .list_all_script_direct::<StoredProcedure>(link.as_str(), None)
        .await
        .unwrap();
    let ids: Vec<_> = scripts.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["sp1", "sp2"]);

    let resp = tk
        .delete_script_direct::<StoredProcedure>(created.system.self_link.clone().unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status, 204);

    let direct = emu.request_log().into_iter().filter(|r| r.direct).collect::<Vec<_>>();
    assert!(!direct.is_empty());
    assert!(direct.iter().all(|r| r.range_id.as_deref() == Some("0")));
}

#[tokio::test]
async fn unsigned_direct_requests_are_rejected() {
    let (tk, _emu) = common::start().await;
    let coll = collection(&tk).await;
    let request = DocumentRequest::new(
        OperationType::ReadFeed,
        ResourceKind::StoredProcedure,
        ResourceAddress::parse(coll.system.self_link.as_deref().unwrap()),
        None,
    );
    let err = tk.client().execute_direct(request).await.unwrap_err();
    assert_eq!(err.status, 401);
    assert!(err.activity_id.is_some());
}
