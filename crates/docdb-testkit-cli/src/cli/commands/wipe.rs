//! `docdb-testkit wipe` – delete every database in the store.

use anyhow::Result;
use docdb_testkit::Testkit;

pub async fn run_wipe(testkit: &Testkit) -> Result<()> {
    testkit.delete_all_databases().await?;
    println!("Deleted all databases.");
    Ok(())
}
