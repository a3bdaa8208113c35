//! Repository layer persisting inventory resources to SQLite

pub mod sqlite_repo;

pub use sqlite_repo::SqliteStore;
