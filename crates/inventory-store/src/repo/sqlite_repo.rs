//! SQLite repository implementation
//!
//! Persists Devices and DiscoverySnapshots as JSON documents keyed by
//! `(kind, uid)`.

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use inventory_core::errors::ExError;
use inventory_core::{InventoryError, Resource, ResourceKind, ResourceStore};
use rusqlite::{Connection, OptionalExtension};

use crate::db;
use crate::errors::{body_error, from_rusqlite, is_constraint_violation, lock_poisoned, Result};
use crate::migrations::apply_migrations;

/// SQLite-backed resource store
///
/// Owns one connection behind a mutex, so a single store can be shared by
/// reference between the reconciler and read queries.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and apply migrations
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut conn = db::open(path)?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database with migrations applied
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| lock_poisoned())
    }
}

/// Timestamps are stored fixed-width so text order matches time order
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn encode(resource: &Resource) -> Result<String> {
    serde_json::to_string(resource).map_err(|e| body_error(resource.uid(), e))
}

fn decode(uid: &str, body: &str) -> Result<Resource> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| body_error(uid, e))?;
    Resource::from_json(value).map_err(|e| body_error(uid, e))
}

impl ResourceStore for SqliteStore {
    fn get(&self, kind: ResourceKind, uid: &str) -> std::result::Result<Resource, ExError> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM resources WHERE kind = ?1 AND uid = ?2",
                rusqlite::params![kind.as_str(), uid],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;

        match body {
            Some(body) => decode(uid, &body),
            None => Err(InventoryError::ResourceNotFound {
                kind,
                uid: uid.to_string(),
            }
            .into()),
        }
    }

    fn list(&self, kind: ResourceKind) -> std::result::Result<Vec<Resource>, ExError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT uid, body FROM resources WHERE kind = ?1 ORDER BY created_at, uid")
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([kind.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        let mut resources = Vec::with_capacity(rows.len());
        for (uid, body) in &rows {
            match decode(uid, body) {
                Ok(resource) => resources.push(resource),
                Err(e) => tracing::warn!(
                    kind = %kind,
                    uid = %uid,
                    error = %e,
                    "undecodable stored resource, leaving it out of the listing"
                ),
            }
        }
        Ok(resources)
    }

    fn create(&self, resource: &Resource) -> std::result::Result<(), ExError> {
        let body = encode(resource)?;
        let meta = resource.metadata();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO resources (kind, uid, name, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                resource.kind().as_str(),
                meta.uid,
                meta.name,
                body,
                timestamp(&meta.created_at),
                timestamp(&meta.updated_at),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                ExError::from(InventoryError::ResourceAlreadyExists {
                    kind: resource.kind(),
                    uid: meta.uid.clone(),
                })
            } else {
                from_rusqlite(e)
            }
        })?;

        tracing::debug!(kind = %resource.kind(), uid = %meta.uid, "resource created");
        Ok(())
    }

    fn update(&self, resource: &Resource) -> std::result::Result<(), ExError> {
        let body = encode(resource)?;
        let meta = resource.metadata();
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE resources SET name = ?3, body = ?4, updated_at = ?5
                 WHERE kind = ?1 AND uid = ?2",
                rusqlite::params![
                    resource.kind().as_str(),
                    meta.uid,
                    meta.name,
                    body,
                    timestamp(&meta.updated_at),
                ],
            )
            .map_err(from_rusqlite)?;

        if changed == 0 {
            return Err(InventoryError::ResourceNotFound {
                kind: resource.kind(),
                uid: meta.uid.clone(),
            }
            .into());
        }

        tracing::debug!(kind = %resource.kind(), uid = %meta.uid, "resource updated");
        Ok(())
    }
}
