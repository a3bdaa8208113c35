//! Snapshot reconciliation
//!
//! Converges the stored device inventory to a discovery snapshot in two
//! passes: upsert every descriptor by serial number, then resolve declared
//! parent serial numbers into parent uids. See [`SnapshotReconciler`] for
//! the externally invoked entry point.

pub mod access;
pub mod entry;
pub mod index;
pub mod link;
pub mod state_machine;
pub mod upsert;

pub use access::StoreAccess;
pub use entry::{ReconcileOutcome, Reconciler, SnapshotReconciler, TriggerPayload};
pub use index::{DeviceIndex, LayeredIndex};
pub use link::{LinkStats, ParentLinkResolver};
pub use state_machine::{ReconcileSummary, SnapshotStateMachine};
pub use upsert::{DeviceUpsertResolver, UpsertOutcome};
