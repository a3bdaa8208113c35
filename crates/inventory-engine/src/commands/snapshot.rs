//! Snapshot submission and reconciliation commands.

#![allow(clippy::result_large_err)]

use std::time::Instant;

use inventory_core::errors::{ExError, ExErrorKind};
use inventory_core::model::{DiscoverySnapshot, Resource, ResourceKind};
use inventory_core::{
    log_op_end, log_op_error, log_op_start, CancelToken, ReconcileOutcome, Reconciler,
    ResourceStore, SnapshotReconciler,
};
use inventory_core_types::RequestContext;

/// Outcome of reconciling one snapshot during a pending sweep
#[derive(Debug, Clone)]
pub struct PendingReconcile {
    pub uid: String,
    pub name: String,
    pub result: Result<ReconcileOutcome, ExError>,
}

impl PendingReconcile {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Store a new, unprocessed snapshot around `raw_data`
///
/// `raw_data` is kept as is; it is only interpreted when reconciled.
///
/// # Errors
///
/// `InvalidInput` for an empty name, or the store error from `create`.
pub fn submit_snapshot<S: ResourceStore + ?Sized>(
    store: &S,
    name: &str,
    raw_data: serde_json::Value,
) -> Result<DiscoverySnapshot, ExError> {
    if name.trim().is_empty() {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("submit_snapshot")
            .with_message("snapshot name must not be empty"));
    }

    let snapshot = DiscoverySnapshot::new(name, raw_data);
    store
        .create(&Resource::DiscoverySnapshot(snapshot.clone()))
        .map_err(|e| e.with_op("submit_snapshot"))?;

    tracing::info!(
        snapshot = snapshot.name(),
        uid = snapshot.uid(),
        "snapshot submitted"
    );
    Ok(snapshot)
}

/// Load a snapshot by uid
///
/// # Errors
///
/// `NotFound` if no snapshot has `uid`.
pub fn load_snapshot<S: ResourceStore + ?Sized>(
    store: &S,
    uid: &str,
) -> Result<DiscoverySnapshot, ExError> {
    store
        .get(ResourceKind::DiscoverySnapshot, uid)?
        .into_snapshot()
        .ok_or_else(|| {
            ExError::new(ExErrorKind::InvalidResourceType)
                .with_op("load_snapshot")
                .with_entity_id(uid)
                .with_message("stored record is not a DiscoverySnapshot")
        })
}

/// All stored snapshots, oldest first
///
/// # Errors
///
/// Returns the store error from `list`.
pub fn list_snapshots<S: ResourceStore + ?Sized>(
    store: &S,
) -> Result<Vec<DiscoverySnapshot>, ExError> {
    Ok(store
        .list(ResourceKind::DiscoverySnapshot)?
        .into_iter()
        .filter_map(Resource::into_snapshot)
        .collect())
}

/// Load and reconcile one snapshot
///
/// # Errors
///
/// `NotFound` for an unknown uid, otherwise whatever the reconciler returns.
pub fn reconcile_snapshot<S: ResourceStore + ?Sized>(
    store: &S,
    uid: &str,
    cancel: &CancelToken,
) -> Result<ReconcileOutcome, ExError> {
    let snapshot = load_snapshot(store, uid)?;
    SnapshotReconciler::new(store).reconcile(snapshot.into(), &RequestContext::new(), cancel)
}

/// Reconcile every snapshot that is not yet `Completed`, oldest first
///
/// A failing snapshot does not stop the sweep; its error is reported in its
/// entry. Cancellation does stop it.
///
/// # Errors
///
/// Returns the store error if snapshots cannot be listed, or `Cancelled`.
pub fn reconcile_pending<S: ResourceStore + ?Sized>(
    store: &S,
    cancel: &CancelToken,
) -> Result<Vec<PendingReconcile>, ExError> {
    let start = Instant::now();
    log_op_start!("reconcile_pending");

    let pending: Vec<DiscoverySnapshot> = list_snapshots(store)?
        .into_iter()
        .filter(|s| !s.is_completed())
        .collect();

    let reconciler = SnapshotReconciler::new(store);
    let mut results = Vec::with_capacity(pending.len());
    for snapshot in pending {
        let uid = snapshot.uid().to_string();
        let name = snapshot.name().to_string();
        let ctx = RequestContext::new();
        let result = reconciler.reconcile(snapshot.into(), &ctx, cancel);

        if let Err(e) = &result {
            if e.is_cancelled() {
                log_op_error!(
                    "reconcile_pending",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    completed = results.len()
                );
                return Err(e.clone());
            }
        }
        results.push(PendingReconcile { uid, name, result });
    }

    let failed = results.iter().filter(|r| !r.is_ok()).count();
    log_op_end!(
        "reconcile_pending",
        duration_ms = start.elapsed().as_millis() as u64,
        reconciled = results.len(),
        failed = failed
    );
    Ok(results)
}
