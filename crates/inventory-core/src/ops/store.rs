//! Store-access capability consumed by the reconciler
//!
//! The reconciler needs only four operations from its persistence backend.
//! Hosts inject an implementation at construction time; the crate ships
//! [`MemoryStore`](super::MemoryStore) and `inventory-store` provides a
//! SQLite-backed one.

use crate::errors::ExError;
use crate::model::{Resource, ResourceKind};

/// CRUD + list-by-kind access to persisted resources
///
/// `create` and `update` fully replace the persisted record. Serial-number
/// uniqueness is not the store's concern.
#[allow(clippy::result_large_err)]
pub trait ResourceStore {
    /// Fetch one resource
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::NotFound` if no resource of `kind` has `uid`.
    fn get(&self, kind: ResourceKind, uid: &str) -> Result<Resource, ExError>;

    /// All current resources of a kind, no pagination
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::Persistence` if the backend cannot be read.
    fn list(&self, kind: ResourceKind) -> Result<Vec<Resource>, ExError>;

    /// Persist a new resource
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::AlreadyExists` if the uid is taken.
    fn create(&self, resource: &Resource) -> Result<(), ExError>;

    /// Replace an existing resource
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::NotFound` if the resource was never created.
    fn update(&self, resource: &Resource) -> Result<(), ExError>;
}

impl<S: ResourceStore + ?Sized> ResourceStore for &S {
    fn get(&self, kind: ResourceKind, uid: &str) -> Result<Resource, ExError> {
        (**self).get(kind, uid)
    }

    fn list(&self, kind: ResourceKind) -> Result<Vec<Resource>, ExError> {
        (**self).list(kind)
    }

    fn create(&self, resource: &Resource) -> Result<(), ExError> {
        (**self).create(resource)
    }

    fn update(&self, resource: &Resource) -> Result<(), ExError> {
        (**self).update(resource)
    }
}
