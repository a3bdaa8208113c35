use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use inventory_core::errors::{ExError, ExErrorKind};
use inventory_core::model::{Device, DiscoverySnapshot, Resource, ResourceKind};
use inventory_core::{CancelToken, MemoryStore, ResourceStore};

/// Store a new snapshot around `raw` and return it as delivered by a trigger
#[allow(dead_code)]
pub fn submit_snapshot(store: &MemoryStore, name: &str, raw: serde_json::Value) -> DiscoverySnapshot {
    let snapshot = DiscoverySnapshot::new(name, raw);
    store
        .create(&snapshot.clone().into())
        .expect("snapshot should be stored");
    snapshot
}

/// Reload a snapshot from the store
#[allow(dead_code)]
pub fn load_snapshot<S: ResourceStore>(store: &S, uid: &str) -> DiscoverySnapshot {
    store
        .get(ResourceKind::DiscoverySnapshot, uid)
        .expect("snapshot should exist")
        .into_snapshot()
        .expect("record should be a snapshot")
}

/// All stored devices
#[allow(dead_code)]
pub fn devices<S: ResourceStore>(store: &S) -> Vec<Device> {
    store
        .list(ResourceKind::Device)
        .expect("device listing should succeed")
        .into_iter()
        .filter_map(Resource::into_device)
        .collect()
}

/// The stored device with `serial`, if any
#[allow(dead_code)]
pub fn device_by_serial<S: ResourceStore>(store: &S, serial: &str) -> Option<Device> {
    devices(store)
        .into_iter()
        .find(|d| d.serial_number() == serial)
}

/// Wraps a `MemoryStore` and fails device writes for chosen serial numbers
///
/// Used to exercise per-device failure handling without a broken backend.
#[allow(dead_code)]
pub struct FailingStore {
    pub inner: MemoryStore,
    fail_creates: HashSet<String>,
    fail_updates: HashSet<String>,
    fail_snapshot_updates: bool,
}

#[allow(dead_code)]
impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_creates: HashSet::new(),
            fail_updates: HashSet::new(),
            fail_snapshot_updates: false,
        }
    }

    pub fn fail_create_for(mut self, serial: &str) -> Self {
        self.fail_creates.insert(serial.to_string());
        self
    }

    pub fn fail_update_for(mut self, serial: &str) -> Self {
        self.fail_updates.insert(serial.to_string());
        self
    }

    pub fn fail_snapshot_updates(mut self) -> Self {
        self.fail_snapshot_updates = true;
        self
    }

    fn injected(op: &str) -> ExError {
        ExError::new(ExErrorKind::Persistence)
            .with_op(op)
            .with_message("injected failure")
    }
}

impl ResourceStore for FailingStore {
    fn get(&self, kind: ResourceKind, uid: &str) -> Result<Resource, ExError> {
        self.inner.get(kind, uid)
    }

    fn list(&self, kind: ResourceKind) -> Result<Vec<Resource>, ExError> {
        self.inner.list(kind)
    }

    fn create(&self, resource: &Resource) -> Result<(), ExError> {
        if let Resource::Device(device) = resource {
            if self.fail_creates.contains(device.serial_number()) {
                return Err(Self::injected("create"));
            }
        }
        self.inner.create(resource)
    }

    fn update(&self, resource: &Resource) -> Result<(), ExError> {
        match resource {
            Resource::Device(device) if self.fail_updates.contains(device.serial_number()) => {
                return Err(Self::injected("update"));
            }
            Resource::DiscoverySnapshot(_) if self.fail_snapshot_updates => {
                return Err(Self::injected("update"));
            }
            _ => {}
        }
        self.inner.update(resource)
    }
}

/// Wraps a `MemoryStore` and requests cancellation once a number of device
/// writes have gone through
#[allow(dead_code)]
pub struct CancellingStore {
    pub inner: MemoryStore,
    cancel: CancelToken,
    after_device_writes: usize,
    device_writes: AtomicUsize,
}

#[allow(dead_code)]
impl CancellingStore {
    pub fn new(cancel: CancelToken, after_device_writes: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            cancel,
            after_device_writes,
            device_writes: AtomicUsize::new(0),
        }
    }

    fn record_device_write(&self, resource: &Resource) {
        if resource.kind() != ResourceKind::Device {
            return;
        }
        let written = self.device_writes.fetch_add(1, Ordering::SeqCst) + 1;
        if written >= self.after_device_writes {
            self.cancel.cancel();
        }
    }
}

impl ResourceStore for CancellingStore {
    fn get(&self, kind: ResourceKind, uid: &str) -> Result<Resource, ExError> {
        self.inner.get(kind, uid)
    }

    fn list(&self, kind: ResourceKind) -> Result<Vec<Resource>, ExError> {
        self.inner.list(kind)
    }

    fn create(&self, resource: &Resource) -> Result<(), ExError> {
        self.inner.create(resource)?;
        self.record_device_write(resource);
        Ok(())
    }

    fn update(&self, resource: &Resource) -> Result<(), ExError> {
        self.inner.update(resource)?;
        self.record_device_write(resource);
        Ok(())
    }
}
