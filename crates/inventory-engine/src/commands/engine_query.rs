//! Engine-level read-only query surface.
//!
//! `apply_engine_query` is the single entry point for reads. Unlike
//! `apply_engine_command` it never writes to the store.

#![allow(clippy::result_large_err)]

use inventory_core::errors::ExError;
use inventory_core::model::{Device, DiscoverySnapshot, Resource, ResourceKind};
use inventory_core::ResourceStore;

use crate::commands::snapshot::{list_snapshots, load_snapshot};

/// Read-only queries supported by the engine.
#[derive(Debug, Clone)]
pub enum EngineQuery {
    /// Get a snapshot by uid, including its status.
    GetSnapshot { uid: String },
    /// All devices, oldest first.
    ListDevices,
    /// All snapshots, oldest first.
    ListSnapshots,
}

/// Result of an engine query.
#[derive(Debug, Clone)]
pub enum EngineQueryResult {
    Snapshot(DiscoverySnapshot),
    Devices(Vec<Device>),
    Snapshots(Vec<DiscoverySnapshot>),
}

/// Apply a read-only query against `store`.
///
/// # Errors
///
/// `NotFound` for an unknown snapshot uid, or the store error.
pub fn apply_engine_query<S: ResourceStore + ?Sized>(
    query: EngineQuery,
    store: &S,
) -> Result<EngineQueryResult, ExError> {
    match query {
        EngineQuery::GetSnapshot { uid } => {
            load_snapshot(store, &uid).map(EngineQueryResult::Snapshot)
        }
        EngineQuery::ListDevices => {
            let devices = store
                .list(ResourceKind::Device)?
                .into_iter()
                .filter_map(Resource::into_device)
                .collect();
            Ok(EngineQueryResult::Devices(devices))
        }
        EngineQuery::ListSnapshots => list_snapshots(store).map(EngineQueryResult::Snapshots),
    }
}
