//! Engine-level action commands.

#![allow(clippy::result_large_err)]

use inventory_core::errors::ExError;
use inventory_core::{CancelToken, ReconcileOutcome, ResourceStore};

use crate::commands::snapshot::{
    reconcile_pending, reconcile_snapshot, submit_snapshot, PendingReconcile,
};

/// Engine-level commands that write to the store.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Store a new snapshot with phase unset.
    SubmitSnapshot {
        name: String,
        raw_data: serde_json::Value,
    },
    /// Reconcile one snapshot by uid.
    ReconcileSnapshot { uid: String },
    /// Reconcile every snapshot that is not yet completed.
    ReconcilePending,
}

/// Result of applying an engine command.
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    /// Uid of the stored snapshot.
    Submitted { uid: String },
    Reconciled(ReconcileOutcome),
    /// One entry per snapshot picked up by the sweep.
    ReconciledPending(Vec<PendingReconcile>),
}

/// Apply an engine command against `store`.
///
/// # Errors
///
/// Returns the failing operation's error. For `ReconcilePending`, failures
/// of individual snapshots are reported inside the result instead.
pub fn apply_engine_command<S: ResourceStore + ?Sized>(
    cmd: EngineCommand,
    store: &S,
    cancel: &CancelToken,
) -> Result<EngineCommandResult, ExError> {
    match cmd {
        EngineCommand::SubmitSnapshot { name, raw_data } => {
            cancel.check("submit_snapshot")?;
            let snapshot = submit_snapshot(store, &name, raw_data)?;
            Ok(EngineCommandResult::Submitted {
                uid: snapshot.uid().to_string(),
            })
        }
        EngineCommand::ReconcileSnapshot { uid } => {
            reconcile_snapshot(store, &uid, cancel).map(EngineCommandResult::Reconciled)
        }
        EngineCommand::ReconcilePending => {
            reconcile_pending(store, cancel).map(EngineCommandResult::ReconciledPending)
        }
    }
}
