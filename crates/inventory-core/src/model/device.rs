use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::meta::{ObjectMeta, API_VERSION, SCHEMA_VERSION};
use super::resource::ResourceKind;

/// Device - one physical unit in the inventory
///
/// Keyed for reconciliation by `spec.serial_number`; the `metadata.uid` is
/// assigned on first sighting and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub api_version: String,
    pub kind: ResourceKind,
    pub schema_version: String,
    pub metadata: ObjectMeta,
    pub spec: DeviceSpec,
    #[serde(default)]
    pub status: DeviceStatus,
}

/// Declarative desired state of a device
///
/// This is also the shape of one descriptor inside a snapshot's rawData.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSpec {
    #[serde(default)]
    pub device_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub manufacturer: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub part_number: String,

    /// Business key; unique among devices
    #[serde(default)]
    pub serial_number: String,

    /// Resolved uid of the parent device, written only by the link pass
    #[serde(default, rename = "parentID", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Declarative parent reference by serial number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_serial_number: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl DeviceSpec {
    /// Minimal spec carrying only a serial number
    pub fn with_serial(serial_number: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            ..Self::default()
        }
    }

    /// Set the declarative parent reference
    pub fn with_parent_serial(mut self, parent_serial: impl Into<String>) -> Self {
        self.parent_serial_number = Some(parent_serial.into());
        self
    }

    /// The declared parent serial number, treating an empty string as absent
    pub fn parent_serial(&self) -> Option<&str> {
        self.parent_serial_number
            .as_deref()
            .filter(|serial| !serial.is_empty())
    }

    /// The resolved parent uid, treating an empty string as absent
    pub fn resolved_parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|uid| !uid.is_empty())
    }
}

/// Observed state of a device
///
/// Present for shape compatibility; the snapshot reconciler never writes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phase: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    #[serde(default)]
    pub ready: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children_device_ids: Vec<String>,
}

impl Device {
    /// Create a new device record from a descriptor
    ///
    /// Allocates a fresh uid, names the device after its serial number and
    /// stamps both timestamps with the current time.
    pub fn new(spec: DeviceSpec) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: ResourceKind::Device,
            schema_version: SCHEMA_VERSION.to_string(),
            metadata: ObjectMeta::new(ResourceKind::Device, spec.serial_number.clone()),
            spec,
            status: DeviceStatus::default(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.metadata.uid
    }

    pub fn serial_number(&self) -> &str {
        &self.spec.serial_number
    }

    /// Replace the spec wholesale, keeping the stored `parent_id`
    ///
    /// Incoming descriptors generally do not carry a resolved parent, so the
    /// link established by an earlier snapshot survives the replacement.
    pub fn replace_spec(&mut self, spec: DeviceSpec) {
        let parent_id = self.spec.parent_id.take();
        self.spec = spec;
        self.spec.parent_id = parent_id;
        self.metadata.touch();
    }

    /// Point this device at a parent uid
    pub fn link_parent(&mut self, parent_uid: &str) {
        self.spec.parent_id = Some(parent_uid.to_string());
        self.metadata.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_device_named_after_serial() {
        let device = Device::new(DeviceSpec::with_serial("SN-100"));

        assert_eq!(device.metadata.name, "SN-100");
        assert_eq!(device.serial_number(), "SN-100");
        assert!(device.uid().starts_with("dev-"));
        assert_eq!(device.kind, ResourceKind::Device);
        assert!(device.spec.parent_id.is_none());
    }

    #[test]
    fn test_replace_spec_preserves_parent_id() {
        let mut device = Device::new(DeviceSpec::with_serial("SN-1"));
        device.link_parent("dev-parent01");

        let mut incoming = DeviceSpec::with_serial("SN-1");
        incoming.manufacturer = "Acme".to_string();
        device.replace_spec(incoming);

        assert_eq!(device.spec.manufacturer, "Acme");
        assert_eq!(device.spec.parent_id.as_deref(), Some("dev-parent01"));
    }

    #[test]
    fn test_replace_spec_ignores_incoming_parent_id() {
        let mut device = Device::new(DeviceSpec::with_serial("SN-1"));
        device.link_parent("dev-stored01");

        let mut incoming = DeviceSpec::with_serial("SN-1");
        incoming.parent_id = Some("dev-bogus001".to_string());
        device.replace_spec(incoming);

        assert_eq!(device.spec.parent_id.as_deref(), Some("dev-stored01"));
    }

    #[test]
    fn test_empty_parent_serial_is_absent() {
        let spec = DeviceSpec::with_serial("SN-1").with_parent_serial("");
        assert_eq!(spec.parent_serial(), None);

        let spec = DeviceSpec::with_serial("SN-1").with_parent_serial("SN-0");
        assert_eq!(spec.parent_serial(), Some("SN-0"));
    }

    #[test]
    fn test_descriptor_json_shape() {
        let spec: DeviceSpec = serde_json::from_value(serde_json::json!({
            "deviceType": "Node",
            "manufacturer": "HPE",
            "serialNumber": "SN-7",
            "parentSerialNumber": "CH-1",
            "properties": {"slot": 3, "firmware": "1.2.0"}
        }))
        .unwrap();

        assert_eq!(spec.device_type, "Node");
        assert_eq!(spec.serial_number, "SN-7");
        assert_eq!(spec.parent_serial(), Some("CH-1"));
        assert_eq!(spec.properties["slot"], serde_json::json!(3));

        let json = serde_json::to_value(&spec).unwrap();
        assert!(json.get("parentID").is_none());
        assert!(json.get("partNumber").is_none());
    }
}
