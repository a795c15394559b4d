//! Replication waits, offer lookups and configuration setters.
//!
//! The setters exist so tests written against a configurable backend keep
//! compiling against the emulator; they log and change nothing.

use std::fmt;
use std::time::Duration;

use tracing::{debug, instrument};

use super::Testkit;
use crate::address::ResourceAddress;
use crate::error::Result;
use crate::resource::Offer;

/// Value handed to the configuration setters.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Duration(Duration),
    Text(String),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(n) => write!(f, "{n}"),
            ConfigValue::Duration(d) => write!(f, "{}ms", d.as_millis()),
            ConfigValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<Duration> for ConfigValue {
    fn from(value: Duration) -> Self {
        ConfigValue::Duration(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

impl Testkit {
    pub async fn set_configuration_property(&self, name: &str, value: impl Into<ConfigValue>) {
        let value = value.into();
        debug!(name, %value, "configuration property ignored");
    }

    pub async fn set_federation_wide_configuration_property(
        &self,
        name: &str,
        value: impl Into<ConfigValue>,
    ) {
        let value = value.into();
        debug!(name, %value, "federation-wide configuration property ignored");
    }

    pub async fn wait_for_config_refresh(&self) {}

    pub async fn wait_for_backend_config_refresh(&self) {}

    /// Sleep for the configured master staleness interval.
    pub async fn wait_for_master_replication(&self) {
        pause(self.config.master_staleness_interval_secs, "master replication").await;
    }

    /// Sleep for the configured server staleness interval.
    pub async fn wait_for_server_replication(&self) {
        pause(self.config.server_staleness_interval_secs, "server replication").await;
    }

    pub async fn wait_while_backend_operation_commits(&self) {
        pause(self.config.operation_commit_wait_secs, "backend commit").await;
    }

    /// Offer type of the offer attached to the collection with rid `collection_rid`.
    #[instrument(skip(self))]
    pub async fn collection_offer_type(&self, collection_rid: &str) -> Result<Option<String>> {
        let offers = self
            .list_all::<Offer>(ResourceAddress::Root, None, true)
            .await?;
        Ok(offers
            .into_iter()
            .find(|offer| offer.offer_resource_id == collection_rid)
            .map(|offer| offer.offer_type))
    }
}

async fn pause(secs: u64, what: &str) {
    if secs == 0 {
        return;
    }
    debug!(secs, "waiting for {what}");
    tokio::time::sleep(Duration::from_secs(secs)).await;
}
