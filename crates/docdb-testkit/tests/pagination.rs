//! Integration tests: paged feeds and continuation tokens.

mod common;

use docdb_testkit::config::EmulatorConfig;
use docdb_testkit::headers::{names, Headers};
use docdb_testkit::request::OperationType;
use docdb_testkit::resource::{Collection, Database, Document, Resource};
use docdb_testkit::ResourceAddress;

fn small_pages(page_size: u32) -> EmulatorConfig {
    EmulatorConfig {
        page_size,
        ..EmulatorConfig::default()
    }
}

fn feed_requests(emu: &docdb_testkit::emulator::Emulator) -> usize {
    emu.request_log()
        .iter()
        .filter(|r| r.operation == OperationType::ReadFeed)
        .count()
}

#[tokio::test]
async fn list_all_concatenates_pages_in_order() {
    let (tk, emu) = common::start_with(common::config_with_emulator(small_pages(7))).await;
    for i in 0..20 {
        tk.create(ResourceAddress::Root, &Database::new(format!("db{i:02}")), None)
            .await
            .unwrap();
    }
    emu.clear_request_log();

    let dbs = tk
        .list_all::<Database>(ResourceAddress::Root, None, false)
        .await
        .unwrap();
    let ids: Vec<_> = dbs.iter().map(|d| d.id.clone()).collect();
    let expected: Vec<_> = (0..20).map(|i| format!("db{i:02}")).collect();
    assert_eq!(ids, expected);
    // 7 + 7 + 6, the last page carries no continuation.
    assert_eq!(feed_requests(&emu), 3);
}

#[tokio::test]
async fn max_item_count_header_sets_page_size() {
    let (tk, emu) = common::start().await;
    let db = tk
        .create(ResourceAddress::Root, &Database::new("db"), None)
        .await
        .unwrap();
    let coll = tk
        .create(db.self_link().unwrap(), &Collection::new("coll"), None)
        .await
        .unwrap();
    for i in 0..10 {
        tk.create(coll.self_link().unwrap(), &Document::new(format!("d{i}")), None)
            .await
            .unwrap();
    }
    emu.clear_request_log();

    let mut headers = Headers::new();
    headers.insert(names::MAX_ITEM_COUNT, "4");
    let docs = tk
        .list_all::<Document>(coll.self_link().unwrap(), Some(&headers), true)
        .await
        .unwrap();
    assert_eq!(docs.len(), 10);
    assert_eq!(feed_requests(&emu), 3);
}

#[tokio::test]
async fn single_page_feed_reports_no_continuation() {
    let (tk, _emu) = common::start().await;
    tk.create(ResourceAddress::Root, &Database::new("only"), None)
        .await
        .unwrap();
    let page = tk
        .read_feed::<Database>(ResourceAddress::Root, None)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(page.is_last());
}

#[tokio::test]
async fn empty_feed_lists_nothing() {
    let (tk, emu) = common::start().await;
    let dbs = tk
        .list_all::<Database>(ResourceAddress::Root, None, false)
        .await
        .unwrap();
    assert!(dbs.is_empty());
    assert_eq!(feed_requests(&emu), 1);
}
