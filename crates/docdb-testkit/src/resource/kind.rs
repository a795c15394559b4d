//! Resource kinds and their addressing properties.

use std::fmt;

/// The kinds of resource the helpers know how to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Database,
    Collection,
    Document,
    User,
    Permission,
    StoredProcedure,
    Trigger,
    UserDefinedFunction,
    Offer,
    PartitionKeyRange,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Database,
        ResourceKind::Collection,
        ResourceKind::Document,
        ResourceKind::User,
        ResourceKind::Permission,
        ResourceKind::StoredProcedure,
        ResourceKind::Trigger,
        ResourceKind::UserDefinedFunction,
        ResourceKind::Offer,
        ResourceKind::PartitionKeyRange,
    ];

    /// Segment used in links (`dbs/{db}/colls/{coll}`) and as the signed resource type.
    pub fn path_segment(self) -> &'static str {
        match self {
            ResourceKind::Database => "dbs",
            ResourceKind::Collection => "colls",
            ResourceKind::Document => "docs",
            ResourceKind::User => "users",
            ResourceKind::Permission => "permissions",
            ResourceKind::StoredProcedure => "sprocs",
            ResourceKind::Trigger => "triggers",
            ResourceKind::UserDefinedFunction => "udfs",
            ResourceKind::Offer => "offers",
            ResourceKind::PartitionKeyRange => "pkranges",
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.path_segment() == segment)
    }

    /// Property holding the items of a feed response.
    pub fn feed_key(self) -> &'static str {
        match self {
            ResourceKind::Database => "Databases",
            ResourceKind::Collection => "DocumentCollections",
            ResourceKind::Document => "Documents",
            ResourceKind::User => "Users",
            ResourceKind::Permission => "Permissions",
            ResourceKind::StoredProcedure => "StoredProcedures",
            ResourceKind::Trigger => "Triggers",
            ResourceKind::UserDefinedFunction => "UserDefinedFunctions",
            ResourceKind::Offer => "Offers",
            ResourceKind::PartitionKeyRange => "PartitionKeyRanges",
        }
    }

    /// Kind of the container this kind lives in; `None` means the account root.
    pub fn parent_kind(self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Database | ResourceKind::Offer => None,
            ResourceKind::Collection | ResourceKind::User => Some(ResourceKind::Database),
            ResourceKind::Permission => Some(ResourceKind::User),
            ResourceKind::Document
            | ResourceKind::StoredProcedure
            | ResourceKind::Trigger
            | ResourceKind::UserDefinedFunction
            | ResourceKind::PartitionKeyRange => Some(ResourceKind::Collection),
        }
    }

    /// Partitioned kinds carry a partition key and are spread over partition key ranges.
    pub fn is_partitioned(self) -> bool {
        matches!(self, ResourceKind::Document)
    }

    /// Kinds stored inside a collection and therefore served by a single partition.
    pub fn is_collection_child(self) -> bool {
        self.parent_kind() == Some(ResourceKind::Collection)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}
