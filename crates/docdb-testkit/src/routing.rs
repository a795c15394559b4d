//! Single-partition routing shim.
//!
//! Helpers that issue partitioned requests against collections with exactly
//! one partition bind the request to that partition explicitly. The lookup
//! goes through the client's [`CollectionCache`] and [`RoutingMapProvider`];
//! nothing here knows how ranges are computed.

use std::cmp::Ordering;

use thiserror::Error;
use tracing::debug;

use crate::client::{CollectionCache, RoutingMapProvider};
use crate::error::Result;
use crate::request::DocumentRequest;
use crate::resource::{PartitionKeyRange, Resource};

/// Lowest effective partition key.
pub const MIN_INCLUSIVE_EPK: &str = "";
/// Upper bound of the effective partition key space; no key reaches it.
pub const MAX_EXCLUSIVE_EPK: &str = "FF";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("collection {collection_rid} has no partition key range overlapping the minimum key")]
    NoOverlappingRange { collection_rid: String },
    #[error("collection {collection_rid} has {count} partition key ranges; expected exactly one")]
    MultipleOverlappingRanges { collection_rid: String, count: usize },
    #[error("resolved collection {collection_id} has no resource id")]
    MissingCollectionRid { collection_id: String },
}

/// Interval over effective partition keys, compared as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePartitionKeyRange {
    pub min: String,
    pub max: String,
    pub is_min_inclusive: bool,
    pub is_max_inclusive: bool,
}

impl EffectivePartitionKeyRange {
    pub fn new(min: impl Into<String>, max: impl Into<String>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
            is_min_inclusive: true,
            is_max_inclusive: false,
        }
    }

    /// Degenerate range holding exactly `epk`.
    pub fn point(epk: impl Into<String>) -> Self {
        let epk = epk.into();
        Self {
            min: epk.clone(),
            max: epk,
            is_min_inclusive: true,
            is_max_inclusive: true,
        }
    }

    /// The whole key space.
    pub fn full() -> Self {
        Self::new(MIN_INCLUSIVE_EPK, MAX_EXCLUSIVE_EPK)
    }

    pub fn of(range: &PartitionKeyRange) -> Self {
        Self::new(range.min_inclusive.clone(), range.max_exclusive.clone())
    }

    pub fn contains(&self, epk: &str) -> bool {
        let above_min = match epk.cmp(self.min.as_str()) {
            Ordering::Greater => true,
            Ordering::Equal => self.is_min_inclusive,
            Ordering::Less => false,
        };
        let below_max = match epk.cmp(self.max.as_str()) {
            Ordering::Less => true,
            Ordering::Equal => self.is_max_inclusive,
            Ordering::Greater => false,
        };
        above_min && below_max
    }

    pub fn overlaps(&self, other: &EffectivePartitionKeyRange) -> bool {
        starts_before_end(self, other) && starts_before_end(other, self)
    }
}

/// Whether `a` starts before `b` ends.
fn starts_before_end(a: &EffectivePartitionKeyRange, b: &EffectivePartitionKeyRange) -> bool {
    match a.min.cmp(&b.max) {
        Ordering::Less => true,
        Ordering::Equal => a.is_min_inclusive && b.is_max_inclusive,
        Ordering::Greater => false,
    }
}

/// Explicit routing target of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKeyRangeIdentity {
    pub collection_rid: String,
    pub range_id: String,
}

impl PartitionKeyRangeIdentity {
    pub fn new(collection_rid: impl Into<String>, range_id: impl Into<String>) -> Self {
        Self {
            collection_rid: collection_rid.into(),
            range_id: range_id.into(),
        }
    }
}

/// Bind `request` to the only partition of its collection.
///
/// Fails when the collection has zero or several ranges overlapping the
/// minimum effective partition key.
pub async fn route_to_only_partition(
    cache: &dyn CollectionCache,
    routing: &dyn RoutingMapProvider,
    request: &mut DocumentRequest,
) -> Result<PartitionKeyRangeIdentity> {
    let collection = cache.resolve_collection(request).await?;
    let collection_rid = collection
        .resource_id()
        .ok_or_else(|| RoutingError::MissingCollectionRid {
            collection_id: collection.id.clone(),
        })?
        .to_string();

    let ranges = routing
        .overlapping_ranges(
            &collection_rid,
            &EffectivePartitionKeyRange::point(MIN_INCLUSIVE_EPK),
        )
        .await?;
    let range = single_range(&collection_rid, ranges)?;

    let identity = PartitionKeyRangeIdentity::new(collection_rid, range.id);
    debug!(
        collection = %identity.collection_rid,
        range = %identity.range_id,
        "routed request to only partition"
    );
    request.route_to(identity.clone());
    Ok(identity)
}

fn single_range(
    collection_rid: &str,
    mut ranges: Vec<PartitionKeyRange>,
) -> Result<PartitionKeyRange, RoutingError> {
    if ranges.len() > 1 {
        return Err(RoutingError::MultipleOverlappingRanges {
            collection_rid: collection_rid.to_string(),
            count: ranges.len(),
        });
    }
    ranges.pop().ok_or_else(|| RoutingError::NoOverlappingRange {
        collection_rid: collection_rid.to_string(),
    })
}
