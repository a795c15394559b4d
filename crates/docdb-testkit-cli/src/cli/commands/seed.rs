//! `docdb-testkit seed` – create a database and collection full of generated documents.

use anyhow::Result;
use docdb_testkit::Testkit;

pub async fn run_seed(
    testkit: &Testkit,
    database: &str,
    collection: &str,
    documents: usize,
    throughput: i64,
) -> Result<()> {
    let created = testkit
        .create_data_set(database, collection, documents, throughput)
        .await?;
    println!(
        "Seeded {documents} documents into {database}/{} ({})",
        created.id,
        created.system.rid.as_deref().unwrap_or("-")
    );
    Ok(())
}
