use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{ExError, InventoryError};

/// Cooperative cancellation signal for one reconcile invocation
///
/// Clones share the same flag. The reconciler checks it before every store
/// call and aborts with `ExErrorKind::Cancelled` once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with `Cancelled` if cancellation was requested
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::Cancelled` naming `op`.
    #[allow(clippy::result_large_err)]
    pub fn check(&self, op: &str) -> Result<(), ExError> {
        if self.is_cancelled() {
            return Err(InventoryError::Cancelled { op: op.to_string() }.into());
        }
        Ok(())
    }
}
