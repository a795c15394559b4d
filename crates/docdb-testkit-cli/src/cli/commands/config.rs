//! `docdb-testkit config` – print where the config lives and what it holds.

use anyhow::Result;
use docdb_testkit::config::{self, TestkitConfig};

pub fn run_config(cfg: &TestkitConfig) -> Result<()> {
    println!("config file: {}", config::config_path()?.display());
    println!("endpoint:    {}", cfg.endpoint);
    let retry = cfg.retry();
    println!(
        "transient:   {} attempts, {} ms apart",
        retry.transient_max_attempts, retry.transient_delay_ms
    );
    println!(
        "throttling:  floor {} ms, cap {}",
        retry.rate_limit_floor_ms,
        retry
            .rate_limit_max_attempts
            .map_or_else(|| "none".to_string(), |n| n.to_string())
    );
    let emulator = cfg.emulator();
    println!(
        "emulator:    {} partition(s) per collection, page size {}",
        emulator.partitions_per_collection, emulator.page_size
    );
    Ok(())
}
