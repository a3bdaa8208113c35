//! Typed, cancellation-aware access to the resource store

use crate::errors::ExError;
use crate::model::{Device, DiscoverySnapshot, Resource, ResourceKind};
use crate::ops::{CancelToken, ResourceStore};

/// Narrow store client used by the resolvers
///
/// Every call checks the cancellation token first, so a cancelled
/// invocation stops at the next store boundary.
pub struct StoreAccess<'a, S: ResourceStore + ?Sized> {
    store: &'a S,
    cancel: &'a CancelToken,
}

#[allow(clippy::result_large_err)]
impl<'a, S: ResourceStore + ?Sized> StoreAccess<'a, S> {
    pub fn new(store: &'a S, cancel: &'a CancelToken) -> Self {
        Self { store, cancel }
    }

    /// All stored devices; records that are not devices are skipped
    pub fn list_devices(&self) -> Result<Vec<Device>, ExError> {
        self.cancel.check("list_devices")?;
        let resources = self
            .store
            .list(ResourceKind::Device)
            .map_err(|e| e.with_op("list_devices"))?;

        let mut devices = Vec::with_capacity(resources.len());
        for resource in resources {
            match resource {
                Resource::Device(device) => devices.push(device),
                other => tracing::warn!(
                    uid = other.uid(),
                    kind = %other.kind(),
                    "non-device record returned by device listing, skipping"
                ),
            }
        }
        Ok(devices)
    }

    pub fn create_device(&self, device: &Device) -> Result<(), ExError> {
        self.cancel.check("create_device")?;
        self.store
            .create(&Resource::Device(device.clone()))
            .map_err(|e| {
                e.with_op("create_device")
                    .with_serial_number(device.serial_number())
            })
    }

    pub fn update_device(&self, device: &Device) -> Result<(), ExError> {
        self.cancel.check("update_device")?;
        self.store
            .update(&Resource::Device(device.clone()))
            .map_err(|e| {
                e.with_op("update_device")
                    .with_serial_number(device.serial_number())
            })
    }

    pub fn update_snapshot(&self, snapshot: &DiscoverySnapshot) -> Result<(), ExError> {
        self.cancel.check("update_snapshot")?;
        self.store
            .update(&Resource::DiscoverySnapshot(snapshot.clone()))
            .map_err(|e| e.with_op("update_snapshot"))
    }
}
