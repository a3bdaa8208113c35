use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::resource::ResourceKind;

/// API version stamped on every resource this core writes
pub const API_VERSION: &str = "v1";

/// Schema version stamped on every resource this core writes
pub const SCHEMA_VERSION: &str = "v1";

/// Identity and bookkeeping shared by all resource kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Opaque, globally unique identifier assigned once at creation
    pub uid: String,

    /// Human-readable name
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ObjectMeta {
    /// Metadata for a brand-new resource: fresh uid, both timestamps now
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            uid: generate_uid(kind),
            name: name.into(),
            labels: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh the update timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Generate a kind-prefixed uid such as `dev-3f9a1c07`
pub fn generate_uid(kind: ResourceKind) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}-{}", kind.uid_prefix(), &simple[..8])
}
