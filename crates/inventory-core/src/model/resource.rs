use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::device::Device;
use super::meta::ObjectMeta;
use super::snapshot::DiscoverySnapshot;
use crate::errors::InventoryError;

/// The resource kinds this inventory persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Device,
    DiscoverySnapshot,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Device => "Device",
            ResourceKind::DiscoverySnapshot => "DiscoverySnapshot",
        }
    }

    /// Prefix used when generating uids for this kind
    pub fn uid_prefix(&self) -> &'static str {
        match self {
            ResourceKind::Device => "dev",
            ResourceKind::DiscoverySnapshot => "snap",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Device" => Ok(ResourceKind::Device),
            "DiscoverySnapshot" => Ok(ResourceKind::DiscoverySnapshot),
            other => Err(InventoryError::Internal {
                message: format!("unknown resource kind: {}", other),
            }),
        }
    }
}

/// A stored resource of any kind
///
/// Serialized untagged: each variant carries its own `kind` field, so the
/// JSON form is exactly the resource document. Decoding goes through
/// [`Resource::from_json`], which dispatches on that field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Device(Device),
    DiscoverySnapshot(DiscoverySnapshot),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Device(_) => ResourceKind::Device,
            Resource::DiscoverySnapshot(_) => ResourceKind::DiscoverySnapshot,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Resource::Device(d) => &d.metadata,
            Resource::DiscoverySnapshot(s) => &s.metadata,
        }
    }

    pub fn uid(&self) -> &str {
        &self.metadata().uid
    }

    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Decode a JSON document, dispatching on its `kind` field
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the document has no known `kind` or does
    /// not match the schema of that kind.
    pub fn from_json(value: serde_json::Value) -> Result<Self, InventoryError> {
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .ok_or_else(|| InventoryError::Serialization {
                message: "resource document has no kind".to_string(),
            })?;
        match kind.parse::<ResourceKind>() {
            Ok(ResourceKind::Device) => Ok(Resource::Device(serde_json::from_value(value)?)),
            Ok(ResourceKind::DiscoverySnapshot) => {
                Ok(Resource::DiscoverySnapshot(serde_json::from_value(value)?))
            }
            Err(_) => Err(InventoryError::Serialization {
                message: format!("unknown resource kind: {}", kind),
            }),
        }
    }

    pub fn into_device(self) -> Option<Device> {
        match self {
            Resource::Device(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_snapshot(self) -> Option<DiscoverySnapshot> {
        match self {
            Resource::DiscoverySnapshot(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Device> for Resource {
    fn from(device: Device) -> Self {
        Resource::Device(device)
    }
}

impl From<DiscoverySnapshot> for Resource {
    fn from(snapshot: DiscoverySnapshot) -> Self {
        Resource::DiscoverySnapshot(snapshot)
    }
}
