use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::errors::{ExError, ExErrorKind, InventoryError};
use crate::model::{Resource, ResourceKind};
use crate::ops::store::ResourceStore;

type Records = HashMap<(ResourceKind, String), Resource>;

/// In-memory store with the same contract as the SQLite backend
///
/// Thread-safe via a single mutex. Counts successful writes so callers can
/// assert that an operation performed no mutation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `create` + `update` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored resources of a kind
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.lock()
            .map(|records| records.keys().filter(|(k, _)| *k == kind).count())
            .unwrap_or(0)
    }

    #[allow(clippy::result_large_err)]
    fn lock(&self) -> Result<MutexGuard<'_, Records>, ExError> {
        self.records.lock().map_err(|_| {
            ExError::new(ExErrorKind::Internal)
                .with_op("memory_store_lock")
                .with_message("store mutex poisoned")
        })
    }
}

impl ResourceStore for MemoryStore {
    fn get(&self, kind: ResourceKind, uid: &str) -> Result<Resource, ExError> {
        self.lock()?
            .get(&(kind, uid.to_string()))
            .cloned()
            .ok_or_else(|| {
                InventoryError::ResourceNotFound {
                    kind,
                    uid: uid.to_string(),
                }
                .into()
            })
    }

    fn list(&self, kind: ResourceKind) -> Result<Vec<Resource>, ExError> {
        let mut resources: Vec<Resource> = self
            .lock()?
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, r)| r.clone())
            .collect();
        resources.sort_by(|a, b| {
            a.metadata()
                .created_at
                .cmp(&b.metadata().created_at)
                .then_with(|| a.uid().cmp(b.uid()))
        });
        Ok(resources)
    }

    fn create(&self, resource: &Resource) -> Result<(), ExError> {
        let key = (resource.kind(), resource.uid().to_string());
        let mut records = self.lock()?;
        if records.contains_key(&key) {
            return Err(InventoryError::ResourceAlreadyExists {
                kind: key.0,
                uid: key.1,
            }
            .into());
        }
        records.insert(key, resource.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn update(&self, resource: &Resource) -> Result<(), ExError> {
        let key = (resource.kind(), resource.uid().to_string());
        let mut records = self.lock()?;
        match records.get_mut(&key) {
            Some(slot) => {
                *slot = resource.clone();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(InventoryError::ResourceNotFound {
                kind: key.0,
                uid: key.1,
            }
            .into()),
        }
    }
}
