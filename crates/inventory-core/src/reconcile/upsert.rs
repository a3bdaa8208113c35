//! Pass 1: create or update one device per descriptor

use crate::errors::ExError;
use crate::model::{Device, DeviceSpec};
use crate::ops::ResourceStore;
use crate::reconcile::access::StoreAccess;
use crate::reconcile::index::DeviceIndex;

/// What the upsert pass did with one descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created(Device),
    Updated(Device),
}

impl UpsertOutcome {
    pub fn into_device(self) -> Device {
        match self {
            UpsertOutcome::Created(d) | UpsertOutcome::Updated(d) => d,
        }
    }
}

/// Decides create vs. update for a descriptor and persists the result
pub struct DeviceUpsertResolver<'a, S: ResourceStore + ?Sized> {
    access: &'a StoreAccess<'a, S>,
    snapshot: &'a str,
}

impl<'a, S: ResourceStore + ?Sized> DeviceUpsertResolver<'a, S> {
    /// `snapshot` is the snapshot name used to tag log lines
    pub fn new(access: &'a StoreAccess<'a, S>, snapshot: &'a str) -> Self {
        Self { access, snapshot }
    }

    /// Upsert one descriptor
    ///
    /// The device is looked up first among devices already touched in this
    /// batch, then among stored devices, so a serial number repeated within
    /// one payload updates the record created for its first occurrence.
    /// Nothing is retained when the store write fails.
    ///
    /// # Errors
    ///
    /// Returns the store error for the failed create or update, or
    /// `Cancelled` if the invocation was cancelled.
    #[allow(clippy::result_large_err)]
    pub fn upsert(
        &self,
        spec: DeviceSpec,
        batch: &DeviceIndex,
        existing: &DeviceIndex,
    ) -> Result<UpsertOutcome, ExError> {
        match batch.layered(existing).get(&spec.serial_number) {
            None => self.create(spec),
            Some(found) => self.update(found.clone(), spec),
        }
    }

    #[allow(clippy::result_large_err)]
    fn create(&self, spec: DeviceSpec) -> Result<UpsertOutcome, ExError> {
        let device = Device::new(spec);
        tracing::info!(
            snapshot = self.snapshot,
            serial_number = device.serial_number(),
            device_uid = device.uid(),
            event = inventory_core_types::schema::EVENT_CREATE,
            "creating new device"
        );
        self.access.create_device(&device)?;
        Ok(UpsertOutcome::Created(device))
    }

    #[allow(clippy::result_large_err)]
    fn update(&self, mut device: Device, spec: DeviceSpec) -> Result<UpsertOutcome, ExError> {
        tracing::info!(
            snapshot = self.snapshot,
            serial_number = device.serial_number(),
            device_uid = device.uid(),
            event = inventory_core_types::schema::EVENT_UPDATE,
            "updating existing device"
        );
        device.replace_spec(spec);
        self.access.update_device(&device)?;
        Ok(UpsertOutcome::Updated(device))
    }
}
