//! Inventory Core - discovery snapshot reconciliation
//!
//! This crate provides the reconciliation kernel for the device inventory,
//! including:
//! - Device and DiscoverySnapshot resource models
//! - The store-access capability and an in-memory implementation
//! - The two-pass snapshot reconciler (device upsert, then parent linking)
//! - Canonical error and logging facilities

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod reconcile;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, InventoryError};
pub use model::{Device, DeviceSpec, DiscoverySnapshot, Resource, ResourceKind, SnapshotPhase};
pub use ops::{CancelToken, MemoryStore, ResourceStore};
pub use reconcile::{
    ReconcileOutcome, ReconcileSummary, Reconciler, SnapshotReconciler, TriggerPayload,
};
