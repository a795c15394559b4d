//! `docdb-testkit list` – show databases or the collections of one database.

use anyhow::Result;
use docdb_testkit::resource::{Collection, Database};
use docdb_testkit::{ResourceAddress, Testkit};

pub async fn run_list(testkit: &Testkit, database: Option<&str>) -> Result<()> {
    match database {
        None => {
            let databases = testkit
                .list_all::<Database>(ResourceAddress::Root, None, true)
                .await?;
            if databases.is_empty() {
                println!("No databases in store.");
                return Ok(());
            }
            println!("{:<14} {}", "RID", "ID");
            for db in databases {
                println!("{:<14} {}", db.system.rid.as_deref().unwrap_or("-"), db.id);
            }
        }
        Some(id) => {
            let collections = testkit
                .list_all::<Collection>(ResourceAddress::database(id), None, true)
                .await?;
            if collections.is_empty() {
                println!("No collections in database {id}.");
                return Ok(());
            }
            println!("{:<14} {:<16} {}", "RID", "PARTITION KEY", "ID");
            for coll in collections {
                let key = coll
                    .partition_key
                    .as_ref()
                    .and_then(|pk| pk.paths.first().cloned())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<14} {:<16} {}",
                    coll.system.rid.as_deref().unwrap_or("-"),
                    key,
                    coll.id
                );
            }
        }
    }
    Ok(())
}
