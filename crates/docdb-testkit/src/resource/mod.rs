//! Resource model: kinds, system properties and the concrete resource types.
//!
//! Every resource exposes the same small interface ([`Resource`]): its
//! user-facing id, its server-assigned rid and self link, and its kind.
//! Helpers are generic over that interface instead of over concrete types.

mod kind;
mod types;

pub use kind::ResourceKind;
pub use types::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::address::ResourceAddress;

/// Properties the server stamps on every stored resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProperties {
    #[serde(rename = "_rid", default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
    #[serde(rename = "_self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(rename = "_etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "_ts", default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

/// Common interface of every resource type.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    /// User-facing identifier.
    fn id(&self) -> &str;

    fn system(&self) -> &SystemProperties;

    fn kind(&self) -> ResourceKind {
        Self::KIND
    }

    fn resource_id(&self) -> Option<&str> {
        self.system().rid.as_deref()
    }

    fn self_link(&self) -> Option<&str> {
        self.system().self_link.as_deref()
    }

    /// Address by rid, the opaque-id request path. `None` until the server has stored it.
    fn rid_address(&self) -> Option<ResourceAddress> {
        self.resource_id().map(|rid| ResourceAddress::Rid(rid.to_string()))
    }

    /// Link of the resource: its self link when known, otherwise its rid.
    fn link(&self) -> Option<ResourceAddress> {
        self.self_link()
            .map(ResourceAddress::parse)
            .or_else(|| self.rid_address())
    }

    /// Self link when stored, otherwise the bare id.
    fn id_or_full_name(&self) -> &str {
        self.self_link().unwrap_or_else(|| self.id())
    }
}
