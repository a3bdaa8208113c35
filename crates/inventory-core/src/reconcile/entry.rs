//! Externally invoked reconcile entry point

use std::time::Instant;

use inventory_core_types::RequestContext;

use crate::errors::{ExError, InventoryError};
use crate::model::{DiscoverySnapshot, Resource, ResourceKind};
use crate::ops::{CancelToken, ResourceStore};
use crate::reconcile::access::StoreAccess;
use crate::reconcile::state_machine::{ReconcileSummary, SnapshotStateMachine};
use crate::{log_op_end, log_op_error, log_op_start};

/// A resource delivered by the trigger, not yet narrowed to a snapshot
#[derive(Debug, Clone)]
pub enum TriggerPayload {
    /// Already decoded into the resource model
    Typed(Resource),
    /// Raw JSON resource document
    Json(serde_json::Value),
}

impl TriggerPayload {
    /// Narrow to a `DiscoverySnapshot`
    ///
    /// # Errors
    ///
    /// `InvalidResourceType` when the payload is some other kind of
    /// resource, `Serialization` when JSON of the right kind does not match
    /// the snapshot schema.
    #[allow(clippy::result_large_err)]
    pub fn into_snapshot(self) -> Result<DiscoverySnapshot, ExError> {
        match self {
            TriggerPayload::Typed(Resource::DiscoverySnapshot(snapshot)) => Ok(snapshot),
            TriggerPayload::Typed(other) => Err(invalid_type(other.kind().as_str())),
            TriggerPayload::Json(value) => {
                let kind = value.get("kind").and_then(|k| k.as_str());
                if kind != Some(ResourceKind::DiscoverySnapshot.as_str()) {
                    return Err(invalid_type(kind.unwrap_or("<missing kind>")));
                }
                serde_json::from_value(value).map_err(|e| {
                    ExError::from(InventoryError::from(e))
                        .with_resource_kind(ResourceKind::DiscoverySnapshot)
                })
            }
        }
    }
}

fn invalid_type(found: &str) -> ExError {
    InventoryError::InvalidResourceType {
        expected: ResourceKind::DiscoverySnapshot,
        found: found.to_string(),
    }
    .into()
}

impl From<DiscoverySnapshot> for TriggerPayload {
    fn from(snapshot: DiscoverySnapshot) -> Self {
        TriggerPayload::Typed(Resource::DiscoverySnapshot(snapshot))
    }
}

/// Result of one reconcile invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The snapshot was already `Completed`; nothing was done
    AlreadyCompleted,
    Completed(ReconcileSummary),
}

/// A reconciler for one kind of resource
pub trait Reconciler {
    fn resource_kind(&self) -> ResourceKind;

    /// Reconcile one delivered resource
    ///
    /// # Errors
    ///
    /// Returns envelope, payload-decode, status-persistence and
    /// cancellation failures; per-device failures are absorbed.
    #[allow(clippy::result_large_err)]
    fn reconcile(
        &self,
        payload: TriggerPayload,
        ctx: &RequestContext,
        cancel: &CancelToken,
    ) -> Result<ReconcileOutcome, ExError>;
}

/// Reconciler for `DiscoverySnapshot` resources
pub struct SnapshotReconciler<S: ResourceStore> {
    store: S,
}

impl<S: ResourceStore> SnapshotReconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ResourceStore> Reconciler for SnapshotReconciler<S> {
    fn resource_kind(&self) -> ResourceKind {
        ResourceKind::DiscoverySnapshot
    }

    fn reconcile(
        &self,
        payload: TriggerPayload,
        ctx: &RequestContext,
        cancel: &CancelToken,
    ) -> Result<ReconcileOutcome, ExError> {
        let start = Instant::now();
        let request_id = ctx.request_id.as_str();

        let snapshot = match payload.into_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let e = e
                    .with_op("reconcile_snapshot")
                    .with_request_id(ctx.request_id.clone());
                log_op_error!(
                    "reconcile_snapshot",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = request_id
                );
                return Err(e);
            }
        };

        let name = snapshot.name().to_string();
        log_op_start!(
            "reconcile_snapshot",
            snapshot = %name,
            request_id = request_id
        );

        if snapshot.is_completed() {
            tracing::debug!(
                snapshot = %name,
                "snapshot already completed, nothing to do"
            );
            log_op_end!(
                "reconcile_snapshot",
                duration_ms = start.elapsed().as_millis() as u64,
                snapshot = %name,
                request_id = request_id
            );
            return Ok(ReconcileOutcome::AlreadyCompleted);
        }

        let access = StoreAccess::new(&self.store, cancel);
        match SnapshotStateMachine::new(access).run(snapshot) {
            Ok(summary) => {
                log_op_end!(
                    "reconcile_snapshot",
                    duration_ms = start.elapsed().as_millis() as u64,
                    snapshot = %name,
                    request_id = request_id,
                    processed = summary.processed,
                    links_updated = summary.links_updated
                );
                Ok(ReconcileOutcome::Completed(summary))
            }
            Err(e) => {
                let e = e.with_request_id(ctx.request_id.clone());
                log_op_error!(
                    "reconcile_snapshot",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    snapshot = %name,
                    request_id = request_id
                );
                Err(e)
            }
        }
    }
}
