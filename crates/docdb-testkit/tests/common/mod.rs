//! Shared setup: an in-memory emulator behind a `Testkit` with every wait zeroed.

#![allow(dead_code)]

use std::sync::Arc;

use docdb_testkit::config::{EmulatorConfig, TestkitConfig};
use docdb_testkit::emulator::Emulator;
use docdb_testkit::{logging, Testkit};

pub fn fast_config() -> TestkitConfig {
    logging::init_test_logging();
    TestkitConfig::default().without_delays()
}

/// Fast config with a custom emulator section.
pub fn config_with_emulator(emulator: EmulatorConfig) -> TestkitConfig {
    let mut cfg = fast_config();
    cfg.emulator = Some(emulator);
    cfg
}

pub async fn start() -> (Testkit, Arc<Emulator>) {
    start_with(fast_config()).await
}

pub async fn start_with(config: TestkitConfig) -> (Testkit, Arc<Emulator>) {
    let emulator = Arc::new(Emulator::in_memory(&config).await.expect("emulator"));
    let testkit = Testkit::new(emulator.clone(), config);
    (testkit, emulator)
}
