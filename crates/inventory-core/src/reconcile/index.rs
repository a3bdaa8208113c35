use std::collections::BTreeMap;

use crate::model::Device;

/// Devices keyed by serial number
///
/// Used both for the devices already stored when a reconcile starts and for
/// the batch set of devices touched by the upsert pass.
#[derive(Debug, Clone, Default)]
pub struct DeviceIndex {
    by_serial: BTreeMap<String, Device>,
}

impl DeviceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index stored devices; records without a serial number are left out
    ///
    /// Should the store hold two records with one serial number, the later
    /// one in iteration order wins.
    pub fn from_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        let mut index = Self::new();
        for device in devices {
            if device.serial_number().is_empty() {
                continue;
            }
            if let Some(previous) = index.insert(device) {
                tracing::warn!(
                    serial_number = previous.serial_number(),
                    device_uid = previous.uid(),
                    "duplicate serial number in store, keeping the later record"
                );
            }
        }
        index
    }

    pub fn get(&self, serial: &str) -> Option<&Device> {
        self.by_serial.get(serial)
    }

    /// Insert or replace by serial number, returning the replaced record
    pub fn insert(&mut self, device: Device) -> Option<Device> {
        self.by_serial
            .insert(device.serial_number().to_string(), device)
    }

    pub fn contains(&self, serial: &str) -> bool {
        self.by_serial.contains_key(serial)
    }

    pub fn len(&self) -> usize {
        self.by_serial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_serial.is_empty()
    }

    /// Serial numbers in ascending order
    pub fn serials(&self) -> impl Iterator<Item = &str> {
        self.by_serial.keys().map(String::as_str)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.by_serial.values()
    }

    /// A read view that consults `self` first and then `base`
    pub fn layered<'a>(&'a self, base: &'a DeviceIndex) -> LayeredIndex<'a> {
        LayeredIndex { top: self, base }
    }
}

/// Read-only union of two indexes; the top layer shadows the base
#[derive(Debug, Clone, Copy)]
pub struct LayeredIndex<'a> {
    top: &'a DeviceIndex,
    base: &'a DeviceIndex,
}

impl<'a> LayeredIndex<'a> {
    pub fn get(&self, serial: &str) -> Option<&'a Device> {
        self.top.get(serial).or_else(|| self.base.get(serial))
    }
}
