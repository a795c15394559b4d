//! CLI for seeding, inspecting and wiping a file-backed emulator store.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docdb_testkit::config::{self, TestkitConfig};
use docdb_testkit::emulator::Emulator;
use docdb_testkit::{logging, Testkit};

use commands::{run_config, run_list, run_seed, run_wipe};

#[derive(Debug, Parser)]
#[command(name = "docdb-testkit")]
#[command(about = "Seed, list and wipe a local document-database emulator store", long_about = None)]
pub struct Cli {
    /// Emulator store file (default: $XDG_STATE_HOME/docdb-testkit/emulator.db).
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Create a database and a partitioned collection filled with generated documents.
    Seed {
        /// Database id.
        database: String,
        /// Collection id.
        collection: String,
        /// Number of documents to generate.
        #[arg(long, default_value = "100", value_name = "N")]
        documents: usize,
        /// Provisioned throughput of the collection.
        #[arg(long, default_value = "400", value_name = "T")]
        throughput: i64,
    },

    /// List databases, or the collections of one database.
    List {
        /// Show the collections of this database instead.
        #[arg(long, value_name = "ID")]
        database: Option<String>,
    },

    /// Delete every database in the store.
    Wipe,

    /// Show the active configuration.
    Config,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        if let CliCommand::Config = cli.command {
            return run_config(&cfg);
        }

        let store = match cli.store {
            Some(path) => path,
            None => default_store_path()?,
        };
        let testkit = open_store(&store, &cfg).await?;

        match cli.command {
            CliCommand::Seed {
                database,
                collection,
                documents,
                throughput,
            } => run_seed(&testkit, &database, &collection, documents, throughput).await?,
            CliCommand::List { database } => run_list(&testkit, database.as_deref()).await?,
            CliCommand::Wipe => run_wipe(&testkit).await?,
            CliCommand::Config => {}
        }

        Ok(())
    }
}

fn default_store_path() -> Result<PathBuf> {
    Ok(logging::state_dir()?.join("emulator.db"))
}

async fn open_store(path: &std::path::Path, cfg: &TestkitConfig) -> Result<Testkit> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let emulator = Emulator::open_at(path, cfg)
        .await
        .with_context(|| format!("opening emulator store {}", path.display()))?;
    tracing::debug!("opened emulator store {}", path.display());
    Ok(Testkit::new(Arc::new(emulator), cfg.clone()))
}

#[cfg(test)]
mod tests;
