//! Phase transitions for one snapshot and the two-pass orchestration

use std::fmt;

use inventory_core_types::schema::{EVENT_FAILED, EVENT_PHASE, EVENT_SKIP};

use crate::errors::ExError;
use crate::model::{DiscoverySnapshot, SnapshotPhase};
use crate::ops::ResourceStore;
use crate::reconcile::access::StoreAccess;
use crate::reconcile::index::DeviceIndex;
use crate::reconcile::link::ParentLinkResolver;
use crate::reconcile::upsert::DeviceUpsertResolver;

/// Status message written on entering `Processing`
pub const MESSAGE_STARTED: &str = "started";

/// Counters for one completed reconcile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Descriptors created or updated in pass 1
    pub processed: usize,
    /// Parent links written in pass 2
    pub links_updated: usize,
    /// Descriptors without a serial number
    pub skipped_empty_serial: usize,
    /// Per-device store failures across both passes
    pub failed: usize,
}

/// Renders the `Completed` status message
impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Snapshot processed successfully. {} devices created/updated, {} parent links updated.",
            self.processed, self.links_updated
        )
    }
}

/// Drives one snapshot from `Processing` to `Completed` or `Error`
pub struct SnapshotStateMachine<'a, S: ResourceStore + ?Sized> {
    access: StoreAccess<'a, S>,
}

impl<'a, S: ResourceStore + ?Sized> SnapshotStateMachine<'a, S> {
    pub fn new(access: StoreAccess<'a, S>) -> Self {
        Self { access }
    }

    /// Run both passes over `snapshot` and record the outcome in its status
    ///
    /// # Errors
    ///
    /// - A failed status write is returned as is.
    /// - An undecodable payload is recorded as `Error` and then returned as
    ///   `PayloadDecode`.
    /// - `Cancelled` is returned without any further status write, leaving
    ///   the snapshot in `Processing`.
    /// - A failure to list stored devices is returned and also leaves the
    ///   snapshot in `Processing`.
    #[allow(clippy::result_large_err)]
    pub fn run(&self, mut snapshot: DiscoverySnapshot) -> Result<ReconcileSummary, ExError> {
        let name = snapshot.name().to_string();

        self.transition(&mut snapshot, SnapshotPhase::Processing, MESSAGE_STARTED)?;

        let specs = match snapshot.decode_payload() {
            Ok(specs) => specs,
            Err(decode_err) => {
                let message = decode_err.to_string();
                tracing::warn!(
                    snapshot = %name,
                    error = %message,
                    "snapshot payload did not decode"
                );
                self.transition(&mut snapshot, SnapshotPhase::Error, message)?;
                return Err(ExError::from(decode_err)
                    .with_op("decode_payload")
                    .with_entity_id(snapshot.uid()));
            }
        };

        let existing = DeviceIndex::from_devices(self.access.list_devices()?);
        tracing::debug!(
            snapshot = %name,
            descriptors = specs.len(),
            known_devices = existing.len(),
            "decoded snapshot payload"
        );

        let mut summary = ReconcileSummary::default();
        let mut batch = DeviceIndex::new();

        let upsert = DeviceUpsertResolver::new(&self.access, &name);
        for spec in specs {
            if spec.serial_number.is_empty() {
                tracing::warn!(
                    snapshot = %name,
                    event = EVENT_SKIP,
                    "skipping device descriptor without serial number"
                );
                summary.skipped_empty_serial += 1;
                continue;
            }

            let serial = spec.serial_number.clone();
            match upsert.upsert(spec, &batch, &existing) {
                Ok(outcome) => {
                    summary.processed += 1;
                    batch.insert(outcome.into_device());
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    tracing::error!(
                        snapshot = %name,
                        serial_number = %serial,
                        event = EVENT_FAILED,
                        error = %e,
                        "failed to upsert device, skipping"
                    );
                    summary.failed += 1;
                }
            }
        }

        let links = ParentLinkResolver::new(&self.access, &name).resolve(&mut batch, &existing)?;
        summary.links_updated = links.links_updated;
        summary.failed += links.failed;
        if links.orphaned > 0 {
            tracing::info!(
                snapshot = %name,
                orphaned = links.orphaned,
                "some devices reference parents that are not known yet"
            );
        }

        self.transition(&mut snapshot, SnapshotPhase::Completed, summary.to_string())?;
        Ok(summary)
    }

    #[allow(clippy::result_large_err)]
    fn transition(
        &self,
        snapshot: &mut DiscoverySnapshot,
        phase: SnapshotPhase,
        message: impl Into<String>,
    ) -> Result<(), ExError> {
        snapshot.set_phase(phase, message);
        tracing::info!(
            snapshot = snapshot.name(),
            phase = phase.as_str(),
            status_message = %snapshot.status.message,
            event = EVENT_PHASE,
            "snapshot phase changed"
        );
        self.access
            .update_snapshot(snapshot)
            .map_err(|e| e.with_entity_id(snapshot.uid()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use crate::model::{Device, DeviceSpec, Resource, ResourceKind};
    use crate::ops::{CancelToken, MemoryStore};
    use serde_json::json;

    fn submitted(store: &MemoryStore, raw: serde_json::Value) -> DiscoverySnapshot {
        let snapshot = DiscoverySnapshot::new("discovery", raw);
        store.create(&snapshot.clone().into()).unwrap();
        snapshot
    }

    fn stored_snapshot(store: &MemoryStore, uid: &str) -> DiscoverySnapshot {
        store
            .get(ResourceKind::DiscoverySnapshot, uid)
            .unwrap()
            .into_snapshot()
            .unwrap()
    }

    fn device_by_serial(store: &MemoryStore, serial: &str) -> Option<Device> {
        store
            .list(ResourceKind::Device)
            .unwrap()
            .into_iter()
            .filter_map(Resource::into_device)
            .find(|d| d.serial_number() == serial)
    }

    #[test]
    fn test_summary_message() {
        let summary = ReconcileSummary {
            processed: 3,
            links_updated: 2,
            ..ReconcileSummary::default()
        };
        assert_eq!(
            summary.to_string(),
            "Snapshot processed successfully. 3 devices created/updated, 2 parent links updated."
        );
    }

    #[test]
    fn test_run_completes_and_links_forward_reference() {
        let store = MemoryStore::new();
        let snapshot = submitted(
            &store,
            json!([
                {"serialNumber": "child", "parentSerialNumber": "parent"},
                {"serialNumber": "parent"}
            ]),
        );

        let cancel = CancelToken::new();
        let machine = SnapshotStateMachine::new(StoreAccess::new(&store, &cancel));
        let summary = machine.run(snapshot.clone()).unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.links_updated, 1);

        let parent = device_by_serial(&store, "parent").unwrap();
        let child = device_by_serial(&store, "child").unwrap();
        assert_eq!(child.spec.parent_id.as_deref(), Some(parent.uid()));

        let stored = stored_snapshot(&store, snapshot.uid());
        assert_eq!(stored.status.phase, Some(SnapshotPhase::Completed));
        assert!(stored.status.ready);
    }

    #[test]
    fn test_decode_failure_records_error() {
        let store = MemoryStore::new();
        let snapshot = submitted(&store, json!({"not": "an array"}));

        let cancel = CancelToken::new();
        let machine = SnapshotStateMachine::new(StoreAccess::new(&store, &cancel));
        let err = machine.run(snapshot.clone()).unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::PayloadDecode);
        let stored = stored_snapshot(&store, snapshot.uid());
        assert_eq!(stored.status.phase, Some(SnapshotPhase::Error));
        assert!(stored.status.message.starts_with("failed to parse rawData: "));
        assert!(!stored.status.ready);
        assert_eq!(store.count(ResourceKind::Device), 0);
    }

    #[test]
    fn test_duplicate_serial_last_write_wins() {
        let store = MemoryStore::new();
        let snapshot = submitted(
            &store,
            json!([
                {"serialNumber": "A", "deviceType": "switch"},
                {"serialNumber": "A", "deviceType": "router"}
            ]),
        );

        let cancel = CancelToken::new();
        let machine = SnapshotStateMachine::new(StoreAccess::new(&store, &cancel));
        let summary = machine.run(snapshot).unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(store.count(ResourceKind::Device), 1);
        let device = device_by_serial(&store, "A").unwrap();
        assert_eq!(device.spec.device_type, "router");
    }

    #[test]
    fn test_empty_serial_is_skipped() {
        let store = MemoryStore::new();
        let snapshot = submitted(
            &store,
            json!([{"serialNumber": ""}, {"serialNumber": "B"}]),
        );

        let cancel = CancelToken::new();
        let machine = SnapshotStateMachine::new(StoreAccess::new(&store, &cancel));
        let summary = machine.run(snapshot).unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped_empty_serial, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(store.count(ResourceKind::Device), 1);
    }

    #[test]
    fn test_existing_link_survives_update() {
        let store = MemoryStore::new();
        let parent = Device::new(DeviceSpec::with_serial("P"));
        let mut child = Device::new(DeviceSpec::with_serial("C"));
        child.link_parent(parent.uid());
        store.create(&parent.clone().into()).unwrap();
        store.create(&child.clone().into()).unwrap();

        let snapshot = submitted(
            &store,
            json!([{"serialNumber": "C", "deviceType": "sensor"}]),
        );

        let cancel = CancelToken::new();
        let machine = SnapshotStateMachine::new(StoreAccess::new(&store, &cancel));
        machine.run(snapshot).unwrap();

        let updated = device_by_serial(&store, "C").unwrap();
        assert_eq!(updated.uid(), child.uid());
        assert_eq!(updated.spec.device_type, "sensor");
        assert_eq!(updated.spec.parent_id.as_deref(), Some(parent.uid()));
    }
}
