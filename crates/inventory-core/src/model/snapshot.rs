use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::device::DeviceSpec;
use super::meta::{ObjectMeta, API_VERSION, SCHEMA_VERSION};
use super::resource::ResourceKind;
use crate::errors::InventoryError;

/// DiscoverySnapshot - one batch of discovered devices to reconcile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySnapshot {
    pub api_version: String,
    pub kind: ResourceKind,
    pub schema_version: String,
    pub metadata: ObjectMeta,
    pub spec: SnapshotSpec,
    #[serde(default)]
    pub status: SnapshotStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSpec {
    /// Opaque payload; expected to be an array of device descriptors
    ///
    /// `None` when the document has no `rawData` at all, which is distinct
    /// from an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub raw_data: Option<serde_json::Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Processing phase of a snapshot
///
/// `Completed` and `Error` are terminal for this core. Only `Completed`
/// short-circuits a later invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotPhase {
    Processing,
    Completed,
    Error,
}

impl SnapshotPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotPhase::Processing => "Processing",
            SnapshotPhase::Completed => "Completed",
            SnapshotPhase::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SnapshotPhase::Completed | SnapshotPhase::Error)
    }
}

impl fmt::Display for SnapshotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStatus {
    /// `None` until the reconciler first picks the snapshot up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<SnapshotPhase>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// True only when the phase is `Completed`
    #[serde(default)]
    pub ready: bool,
}

impl DiscoverySnapshot {
    /// Create an unprocessed snapshot around a raw payload
    pub fn new(name: impl Into<String>, raw_data: serde_json::Value) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: ResourceKind::DiscoverySnapshot,
            schema_version: SCHEMA_VERSION.to_string(),
            metadata: ObjectMeta::new(ResourceKind::DiscoverySnapshot, name),
            spec: SnapshotSpec {
                raw_data: Some(raw_data),
            },
            status: SnapshotStatus::default(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.metadata.uid
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn is_completed(&self) -> bool {
        self.status.phase == Some(SnapshotPhase::Completed)
    }

    /// Move to a new phase; `ready` follows the phase
    pub fn set_phase(&mut self, phase: SnapshotPhase, message: impl Into<String>) {
        self.status.phase = Some(phase);
        self.status.message = message.into();
        self.status.ready = phase == SnapshotPhase::Completed;
        self.metadata.touch();
    }

    /// Decode rawData into device descriptors, preserving payload order
    ///
    /// # Errors
    ///
    /// An explicit `null` decodes as an empty batch.
    ///
    /// # Errors
    ///
    /// Returns `PayloadDecode` if rawData is missing or is not an array of
    /// descriptors.
    pub fn decode_payload(&self) -> Result<Vec<DeviceSpec>, InventoryError> {
        match &self.spec.raw_data {
            None => Err(InventoryError::PayloadDecode {
                message: "rawData is missing".to_string(),
            }),
            Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(raw) => {
                serde_json::from_value(raw.clone()).map_err(|e| InventoryError::PayloadDecode {
                    message: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_snapshot_is_unset() {
        let snapshot = DiscoverySnapshot::new("snap-a", json!([]));
        assert!(snapshot.status.phase.is_none());
        assert!(!snapshot.status.ready);
        assert!(!snapshot.is_completed());
        assert!(snapshot.uid().starts_with("snap-"));
    }

    #[test]
    fn test_ready_follows_phase() {
        let mut snapshot = DiscoverySnapshot::new("snap-a", json!([]));

        snapshot.set_phase(SnapshotPhase::Processing, "started");
        assert!(!snapshot.status.ready);

        snapshot.set_phase(SnapshotPhase::Completed, "done");
        assert!(snapshot.status.ready);
        assert!(snapshot.is_completed());

        snapshot.set_phase(SnapshotPhase::Error, "boom");
        assert!(!snapshot.status.ready);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(!SnapshotPhase::Processing.is_terminal());
        assert!(SnapshotPhase::Completed.is_terminal());
        assert!(SnapshotPhase::Error.is_terminal());
    }

    #[test]
    fn test_decode_payload_preserves_order() {
        let snapshot = DiscoverySnapshot::new(
            "snap-a",
            json!([{"serialNumber": "B"}, {"serialNumber": "A"}]),
        );
        let specs = snapshot.decode_payload().unwrap();
        let serials: Vec<_> = specs.iter().map(|s| s.serial_number.as_str()).collect();
        assert_eq!(serials, vec!["B", "A"]);
    }

    #[test]
    fn test_decode_payload_rejects_object() {
        let snapshot = DiscoverySnapshot::new("snap-a", json!({"debug": "true"}));
        let err = snapshot.decode_payload().unwrap_err();
        assert!(matches!(err, InventoryError::PayloadDecode { .. }));
    }

    #[test]
    fn test_null_payload_is_empty_batch() {
        let snapshot = DiscoverySnapshot::new("snap-a", serde_json::Value::Null);
        assert!(snapshot.decode_payload().unwrap().is_empty());
    }

    #[test]
    fn test_missing_raw_data_decodes_envelope_but_not_payload() {
        let mut doc = serde_json::to_value(DiscoverySnapshot::new("snap-a", json!([]))).unwrap();
        doc["spec"] = json!({});

        let snapshot: DiscoverySnapshot = serde_json::from_value(doc).unwrap();

        assert!(snapshot.spec.raw_data.is_none());
        let err = snapshot.decode_payload().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse rawData: rawData is missing");
    }

    #[test]
    fn test_explicit_null_survives_round_trip() {
        let snapshot = DiscoverySnapshot::new("snap-a", serde_json::Value::Null);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["spec"].get("rawData").is_some());

        let back: DiscoverySnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.spec.raw_data, Some(serde_json::Value::Null));
    }

    #[test]
    fn test_status_json_uses_phase_names() {
        let mut snapshot = DiscoverySnapshot::new("snap-a", json!([]));
        snapshot.set_phase(SnapshotPhase::Completed, "ok");
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"]["phase"], "Completed");
        assert_eq!(json["status"]["ready"], true);
        assert_eq!(json["kind"], "DiscoverySnapshot");
        assert!(json["spec"]["rawData"].is_array());
    }
}
