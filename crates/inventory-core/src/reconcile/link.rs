//! Pass 2: resolve declared parent serial numbers into parent uids

use crate::errors::ExError;
use crate::ops::ResourceStore;
use crate::reconcile::access::StoreAccess;
use crate::reconcile::index::DeviceIndex;

use inventory_core_types::schema::{EVENT_FAILED, EVENT_LINK, EVENT_SKIP};

/// Counters produced by one link pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Devices whose `parent_id` was written
    pub links_updated: usize,
    /// Devices already pointing at the right parent
    pub already_linked: usize,
    /// Devices whose declared parent is not in the index
    pub orphaned: usize,
    /// Devices whose link update failed to persist
    pub failed: usize,
}

/// Links every device touched in a batch to its declared parent
pub struct ParentLinkResolver<'a, S: ResourceStore + ?Sized> {
    access: &'a StoreAccess<'a, S>,
    snapshot: &'a str,
}

impl<'a, S: ResourceStore + ?Sized> ParentLinkResolver<'a, S> {
    pub fn new(access: &'a StoreAccess<'a, S>, snapshot: &'a str) -> Self {
        Self { access, snapshot }
    }

    /// Resolve parent links for every device in `batch`
    ///
    /// Parents are looked up in `batch` layered over `existing`. Targets are
    /// computed from that view before any write, so no resolution depends on
    /// a value written earlier in the same pass. Devices already linked to
    /// the resolved parent are left untouched, which makes a second run over
    /// the same inputs a no-op. Linked records in `batch` are replaced with
    /// their persisted versions.
    ///
    /// # Errors
    ///
    /// Only `Cancelled` aborts the pass; other per-device store failures are
    /// logged and counted.
    #[allow(clippy::result_large_err)]
    pub fn resolve(
        &self,
        batch: &mut DeviceIndex,
        existing: &DeviceIndex,
    ) -> Result<LinkStats, ExError> {
        let mut stats = LinkStats::default();
        let mut pending = Vec::new();

        let view = batch.layered(existing);
        for device in batch.devices() {
            let Some(parent_serial) = device.spec.parent_serial() else {
                continue;
            };

            let Some(parent) = view.get(parent_serial) else {
                tracing::warn!(
                    snapshot = self.snapshot,
                    serial_number = device.serial_number(),
                    parent_serial_number = parent_serial,
                    event = EVENT_SKIP,
                    "parent device not found, leaving device unlinked"
                );
                stats.orphaned += 1;
                continue;
            };

            if parent_serial == device.serial_number() {
                tracing::warn!(
                    snapshot = self.snapshot,
                    serial_number = device.serial_number(),
                    "device declares itself as its own parent"
                );
            }

            if device.spec.resolved_parent() == Some(parent.uid()) {
                tracing::debug!(
                    snapshot = self.snapshot,
                    serial_number = device.serial_number(),
                    event = EVENT_SKIP,
                    "parent link already up to date"
                );
                stats.already_linked += 1;
                continue;
            }

            let mut linked = device.clone();
            linked.link_parent(parent.uid());
            pending.push(linked);
        }

        for device in pending {
            match self.access.update_device(&device) {
                Ok(()) => {
                    tracing::info!(
                        snapshot = self.snapshot,
                        serial_number = device.serial_number(),
                        device_uid = device.uid(),
                        parent_uid = device.spec.resolved_parent().unwrap_or_default(),
                        event = EVENT_LINK,
                        "linked device to parent"
                    );
                    stats.links_updated += 1;
                    batch.insert(device);
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    tracing::error!(
                        snapshot = self.snapshot,
                        serial_number = device.serial_number(),
                        event = EVENT_FAILED,
                        error = %e,
                        "failed to persist parent link"
                    );
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Device, DeviceSpec, ResourceKind};
    use crate::ops::{CancelToken, MemoryStore};

    fn stored(store: &MemoryStore, spec: DeviceSpec) -> Device {
        let device = Device::new(spec);
        store.create(&device.clone().into()).unwrap();
        device
    }

    #[test]
    fn test_links_child_to_parent_in_batch() {
        let store = MemoryStore::new();
        let parent = stored(&store, DeviceSpec::with_serial("P"));
        let child = stored(&store, DeviceSpec::with_serial("C").with_parent_serial("P"));
        let mut batch = DeviceIndex::from_devices(vec![parent.clone(), child.clone()]);

        let cancel = CancelToken::new();
        let access = StoreAccess::new(&store, &cancel);
        let stats = ParentLinkResolver::new(&access, "snap-t")
            .resolve(&mut batch, &DeviceIndex::new())
            .unwrap();

        assert_eq!(stats.links_updated, 1);
        let persisted = store
            .get(ResourceKind::Device, child.uid())
            .unwrap()
            .into_device()
            .unwrap();
        assert_eq!(persisted.spec.parent_id.as_deref(), Some(parent.uid()));
        assert_eq!(
            batch.get("C").and_then(|d| d.spec.resolved_parent()),
            Some(parent.uid())
        );
    }

    #[test]
    fn test_parent_outside_batch_resolves() {
        let store = MemoryStore::new();
        let parent = stored(&store, DeviceSpec::with_serial("P"));
        let child = stored(&store, DeviceSpec::with_serial("C").with_parent_serial("P"));
        let existing = DeviceIndex::from_devices(vec![parent.clone()]);
        let mut batch = DeviceIndex::from_devices(vec![child]);

        let cancel = CancelToken::new();
        let access = StoreAccess::new(&store, &cancel);
        let stats = ParentLinkResolver::new(&access, "snap-t")
            .resolve(&mut batch, &existing)
            .unwrap();

        assert_eq!(stats.links_updated, 1);
        assert_eq!(
            batch.get("C").and_then(|d| d.spec.resolved_parent()),
            Some(parent.uid())
        );
    }

    #[test]
    fn test_missing_parent_is_orphan_not_error() {
        let store = MemoryStore::new();
        let child = stored(&store, DeviceSpec::with_serial("X").with_parent_serial("missing"));
        let mut batch = DeviceIndex::from_devices(vec![child]);
        let writes_before = store.write_count();

        let cancel = CancelToken::new();
        let access = StoreAccess::new(&store, &cancel);
        let stats = ParentLinkResolver::new(&access, "snap-t")
            .resolve(&mut batch, &DeviceIndex::new())
            .unwrap();

        assert_eq!(stats.orphaned, 1);
        assert_eq!(stats.links_updated, 0);
        assert_eq!(store.write_count(), writes_before);
    }

    #[test]
    fn test_second_run_is_noop() {
        let store = MemoryStore::new();
        let parent = stored(&store, DeviceSpec::with_serial("P"));
        let child = stored(&store, DeviceSpec::with_serial("C").with_parent_serial("P"));
        let mut batch = DeviceIndex::from_devices(vec![parent, child]);

        let cancel = CancelToken::new();
        let access = StoreAccess::new(&store, &cancel);
        let resolver = ParentLinkResolver::new(&access, "snap-t");

        let first = resolver.resolve(&mut batch, &DeviceIndex::new()).unwrap();
        let writes_after_first = store.write_count();
        let second = resolver.resolve(&mut batch, &DeviceIndex::new()).unwrap();

        assert_eq!(first.links_updated, 1);
        assert_eq!(second.links_updated, 0);
        assert_eq!(second.already_linked, 1);
        assert_eq!(store.write_count(), writes_after_first);
    }

    #[test]
    fn test_root_devices_are_skipped_silently() {
        let store = MemoryStore::new();
        let root = stored(&store, DeviceSpec::with_serial("R").with_parent_serial(""));
        let mut batch = DeviceIndex::from_devices(vec![root]);

        let cancel = CancelToken::new();
        let access = StoreAccess::new(&store, &cancel);
        let stats = ParentLinkResolver::new(&access, "snap-t")
            .resolve(&mut batch, &DeviceIndex::new())
            .unwrap();

        assert_eq!(stats, LinkStats::default());
    }
}
