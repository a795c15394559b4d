use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Well-known master key of the local emulator.
pub const EMULATOR_MASTER_KEY: &str =
    "C2y6yDjf5/R+ob0N8A7Cgv30VRDJIWEHLM+4QDU5DE2nQ9nDuVTqobD4b8mGGyPMbIZnqyMsEcaGQy67XIw/Jw==";

/// Retry parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts (including the first) for transient server errors.
    pub transient_max_attempts: u32,
    /// Fixed delay between transient attempts, in milliseconds.
    pub transient_delay_ms: u64,
    /// Lower bound of the wait after a 429, in milliseconds.
    pub rate_limit_floor_ms: u64,
    /// Cap on rate-limited attempts. None = retry until the server relents.
    pub rate_limit_max_attempts: Option<u32>,
    /// Attempts of a full account wipe.
    pub cleanup_attempts: u32,
    /// Wait after a 429 or 408 during a wipe, in milliseconds.
    pub cleanup_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            transient_max_attempts: 5,
            transient_delay_ms: 5000,
            rate_limit_floor_ms: 1000,
            rate_limit_max_attempts: None,
            cleanup_attempts: 3,
            cleanup_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn rate_limiting_policy(&self) -> RetryPolicy {
        RetryPolicy::rate_limiting(Duration::from_millis(self.rate_limit_floor_ms))
            .with_max_attempts(self.rate_limit_max_attempts)
    }

    pub fn transient_policy(&self) -> RetryPolicy {
        RetryPolicy::transient(
            self.transient_max_attempts,
            Duration::from_millis(self.transient_delay_ms),
        )
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_millis(self.cleanup_delay_ms)
    }
}

/// In-process emulator behaviour (optional `[emulator]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Partition key ranges created for every new collection.
    pub partitions_per_collection: u32,
    /// Feed page size when the request does not set `x-ms-max-item-count`.
    pub page_size: u32,
    /// Throughput of a collection's offer when the create request names none.
    pub default_offer_throughput: i64,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            partitions_per_collection: 1,
            page_size: 100,
            default_offer_throughput: 400,
        }
    }
}

/// Global configuration loaded from `~/.config/docdb-testkit/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestkitConfig {
    /// Service endpoint the helpers target.
    pub endpoint: String,
    /// Base64 master key used to sign direct requests.
    pub master_key: String,
    /// Wait after writes for replicas to catch up, in seconds.
    pub server_staleness_interval_secs: u64,
    /// Wait after control-plane writes for the master to catch up, in seconds.
    pub master_staleness_interval_secs: u64,
    /// Wait for a backend operation (offer replace and the like) to commit, in seconds.
    pub operation_commit_wait_secs: u64,
    /// Optional retry parameters; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
    /// Optional emulator parameters; if missing, built-in defaults are used.
    pub emulator: Option<EmulatorConfig>,
}

impl Default for TestkitConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://localhost:8081/".to_string(),
            master_key: EMULATOR_MASTER_KEY.to_string(),
            server_staleness_interval_secs: 0,
            master_staleness_interval_secs: 0,
            operation_commit_wait_secs: 2,
            retry: None,
            emulator: None,
        }
    }
}

impl TestkitConfig {
    pub fn retry(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn emulator(&self) -> EmulatorConfig {
        self.emulator.clone().unwrap_or_default()
    }

    /// Same configuration with every wait and retry delay set to zero.
    pub fn without_delays(mut self) -> Self {
        self.server_staleness_interval_secs = 0;
        self.master_staleness_interval_secs = 0;
        self.operation_commit_wait_secs = 0;
        let mut retry = self.retry();
        retry.transient_delay_ms = 0;
        retry.rate_limit_floor_ms = 0;
        retry.cleanup_delay_ms = 0;
        self.retry = Some(retry);
        self
    }

    pub fn endpoint_url(&self) -> Result<url::Url> {
        url::Url::parse(&self.endpoint).with_context(|| format!("invalid endpoint {}", self.endpoint))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("docdb-testkit")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TestkitConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TestkitConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<TestkitConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: TestkitConfig = toml::from_str(&data)?;
    cfg.endpoint_url()?;
    Ok(cfg)
}
