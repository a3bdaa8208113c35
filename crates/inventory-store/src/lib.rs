//! Inventory Store - SQLite persistence for inventory resources
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - `SqliteStore`, the durable implementation of the store-access capability

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteStore;
