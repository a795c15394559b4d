//! Resource addresses: by opaque rid or by hierarchical name.
//!
//! Which form an address takes decides how a request is built: name-based
//! addresses walk `dbs/{db}/colls/{coll}/...` while rid addresses name a
//! resource directly.

use std::fmt;

use crate::resource::ResourceKind;

/// Where a request points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceAddress {
    /// The account itself; container of databases and offers.
    Root,
    /// Opaque server-assigned resource id.
    Rid(String),
    /// Hierarchical path of (segment, name-or-rid) pairs, e.g. `dbs/db1/colls/c1`.
    Path(String),
}

impl ResourceAddress {
    /// Classify a raw id-or-name string.
    ///
    /// Empty input is the account root; input whose first segment is a
    /// top-level path segment (`dbs`, `offers`) is a path; anything else is a rid.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return ResourceAddress::Root;
        }
        let first = trimmed.split('/').next().unwrap_or_default();
        let top_level = [ResourceKind::Database, ResourceKind::Offer]
            .iter()
            .any(|kind| kind.path_segment() == first);
        if top_level {
            ResourceAddress::Path(trimmed.to_string())
        } else {
            ResourceAddress::Rid(trimmed.to_string())
        }
    }

    /// Name-based path of a database.
    pub fn database(database_id: &str) -> Self {
        ResourceAddress::Path(format!("dbs/{database_id}"))
    }

    /// Name-based path of a collection.
    pub fn collection(database_id: &str, collection_id: &str) -> Self {
        ResourceAddress::Path(format!("dbs/{database_id}/colls/{collection_id}"))
    }

    /// Name-based path of a document.
    pub fn document(database_id: &str, collection_id: &str, document_id: &str) -> Self {
        ResourceAddress::Path(format!(
            "dbs/{database_id}/colls/{collection_id}/docs/{document_id}"
        ))
    }

    /// Append a `{kind}/{id}` pair. Only meaningful for paths and the root.
    pub fn child(&self, kind: ResourceKind, id: &str) -> Self {
        match self {
            ResourceAddress::Root => ResourceAddress::Path(format!("{}/{id}", kind.path_segment())),
            ResourceAddress::Path(path) | ResourceAddress::Rid(path) => {
                ResourceAddress::Path(format!("{path}/{}/{id}", kind.path_segment()))
            }
        }
    }

    pub fn is_name_based(&self) -> bool {
        matches!(self, ResourceAddress::Path(_))
    }

    /// Raw form, as used for request signing. Empty for the root.
    pub fn as_str(&self) -> &str {
        match self {
            ResourceAddress::Root => "",
            ResourceAddress::Rid(s) | ResourceAddress::Path(s) => s,
        }
    }

    pub fn segments(&self) -> Vec<&str> {
        match self {
            ResourceAddress::Root => Vec::new(),
            ResourceAddress::Rid(s) | ResourceAddress::Path(s) => {
                s.split('/').filter(|seg| !seg.is_empty()).collect()
            }
        }
    }
}

impl Default for ResourceAddress {
    fn default() -> Self {
        ResourceAddress::Root
    }
}

impl From<&str> for ResourceAddress {
    fn from(raw: &str) -> Self {
        ResourceAddress::parse(raw)
    }
}

impl From<String> for ResourceAddress {
    fn from(raw: String) -> Self {
        ResourceAddress::parse(&raw)
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceAddress::Root => f.write_str("<root>"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_slash_are_root() {
        assert_eq!(ResourceAddress::parse(""), ResourceAddress::Root);
        assert_eq!(ResourceAddress::parse("/"), ResourceAddress::Root);
    }

    #[test]
    fn dbs_prefix_is_name_based() {
        let addr = ResourceAddress::parse("/dbs/db1/colls/c1/");
        assert!(addr.is_name_based());
        assert_eq!(addr.as_str(), "dbs/db1/colls/c1");
        assert_eq!(addr.segments(), vec!["dbs", "db1", "colls", "c1"]);
    }

    #[test]
    fn offers_prefix_is_name_based() {
        assert!(ResourceAddress::parse("offers/AbCdEfGh/").is_name_based());
    }

    #[test]
    fn bare_token_is_rid() {
        let addr = ResourceAddress::parse("dbsAbC12x");
        assert_eq!(addr, ResourceAddress::Rid("dbsAbC12x".to_string()));
        assert!(!addr.is_name_based());
    }

    #[test]
    fn builders_produce_name_paths() {
        assert_eq!(
            ResourceAddress::document("db", "coll", "doc").as_str(),
            "dbs/db/colls/coll/docs/doc"
        );
        assert_eq!(
            ResourceAddress::database("db").child(ResourceKind::User, "u1").as_str(),
            "dbs/db/users/u1"
        );
        assert_eq!(
            ResourceAddress::Root.child(ResourceKind::Database, "db").as_str(),
            "dbs/db"
        );
    }
}
