//! Inventory Engine - Orchestration layer
//!
//! Provides high-level command orchestration that coordinates between
//! the reconciliation core and a resource store.

pub mod commands;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::engine_query::{apply_engine_query, EngineQuery, EngineQueryResult};
