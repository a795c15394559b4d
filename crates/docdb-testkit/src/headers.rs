//! Case-insensitive request/response header collection.

use std::collections::BTreeMap;

/// Header names used by the helpers and the emulator.
pub mod names {
    pub const ACTIVITY_ID: &str = "x-ms-activity-id";
    pub const AUTHORIZATION: &str = "authorization";
    pub const CONTINUATION: &str = "x-ms-continuation";
    pub const ITEM_COUNT: &str = "x-ms-item-count";
    pub const MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
    pub const OFFER_THROUGHPUT: &str = "x-ms-offer-throughput";
    pub const PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
    pub const PARTITION_KEY_RANGE_ID: &str = "x-ms-documentdb-partitionkeyrangeid";
    pub const RETRY_AFTER_MS: &str = "x-ms-retry-after-ms";
    pub const SESSION_TOKEN: &str = "x-ms-session-token";
    pub const X_DATE: &str = "x-ms-date";
}

/// Partition key value meaning "no partition key", sent with partitioned requests.
pub const EMPTY_PARTITION_KEY: &str = "[]";

/// Ordered header map; names are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Insert or replace a header, returning the previous value.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        self.entries.insert(name.to_ascii_lowercase(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Continuation token, if present and non-empty.
    pub fn continuation(&self) -> Option<&str> {
        self.get(names::CONTINUATION).filter(|c| !c.is_empty())
    }

    pub fn set_continuation(&mut self, token: impl Into<String>) {
        self.insert(names::CONTINUATION, token);
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        headers.extend(iter);
        headers
    }
}

impl<K: AsRef<str>, V: Into<String>> Extend<(K, V)> for Headers {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k.as_ref(), v);
        }
    }
}
