//! Concrete resource types as they appear on the wire.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Resource, ResourceKind, SystemProperties};

macro_rules! impl_resource {
    ($ty:ty, $kind:expr) => {
        impl Resource for $ty {
            const KIND: ResourceKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn system(&self) -> &SystemProperties {
                &self.system
            }
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: String,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl Database {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

impl_resource!(Database, ResourceKind::Database);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionKind {
    #[default]
    Hash,
    Range,
}

/// Paths whose values decide which partition a document lands in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionKeyDefinition {
    pub paths: Vec<String>,
    #[serde(default)]
    pub kind: PartitionKind,
}

impl PartitionKeyDefinition {
    pub fn hash(path: impl Into<String>) -> Self {
        Self {
            paths: vec![path.into()],
            kind: PartitionKind::Hash,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<PartitionKeyDefinition>,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl Collection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_partition_key(mut self, definition: PartitionKeyDefinition) -> Self {
        self.partition_key = Some(definition);
        self
    }
}

impl_resource!(Collection, ResourceKind::Collection);

/// A free-form JSON document.
///
/// `system` is declared before `properties` so the system fields are claimed
/// first and do not leak into the property map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub system: SystemProperties,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

impl_resource!(Document, ResourceKind::Document);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

impl_resource!(User, ResourceKind::User);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionMode {
    #[default]
    Read,
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: String,
    pub permission_mode: PermissionMode,
    /// Link of the resource the permission grants access to.
    pub resource: String,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl_resource!(Permission, ResourceKind::Permission);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredProcedure {
    pub id: String,
    pub body: String,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl StoredProcedure {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            ..Self::default()
        }
    }
}

impl_resource!(StoredProcedure, ResourceKind::StoredProcedure);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerType {
    #[default]
    Pre,
    Post,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerOperation {
    #[default]
    All,
    Create,
    Replace,
    Delete,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub id: String,
    pub body: String,
    pub trigger_type: TriggerType,
    pub trigger_operation: TriggerOperation,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl_resource!(Trigger, ResourceKind::Trigger);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDefinedFunction {
    pub id: String,
    pub body: String,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl_resource!(UserDefinedFunction, ResourceKind::UserDefinedFunction);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferContent {
    pub offer_throughput: i64,
}

/// Provisioned throughput attached to a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub offer_type: String,
    pub offer_version: String,
    /// Rid of the collection the offer belongs to.
    pub offer_resource_id: String,
    /// Self link of the collection the offer belongs to.
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<OfferContent>,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl_resource!(Offer, ResourceKind::Offer);

/// A contiguous slice `[min_inclusive, max_exclusive)` of the effective partition key space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionKeyRange {
    pub id: String,
    pub min_inclusive: String,
    pub max_exclusive: String,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl PartitionKeyRange {
    pub fn new(
        id: impl Into<String>,
        min_inclusive: impl Into<String>,
        max_exclusive: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            min_inclusive: min_inclusive.into(),
            max_exclusive: max_exclusive.into(),
            ..Self::default()
        }
    }
}

impl_resource!(PartitionKeyRange, ResourceKind::PartitionKeyRange);
