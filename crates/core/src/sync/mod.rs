//! Local order status synchronization.
//!
//! Two slots of an origin-scoped key-value store hold the state:
//!
//! - [`LOCAL_ORDERS_KEY`] - JSON array of [`LocalOrder`](crate::LocalOrder)
//! - [`STATUS_UPDATES_KEY`] - JSON object mapping order id to a terminal
//!   status, written by the administrative confirmation pages
//!
//! [`reconcile`] folds pending updates into the cached orders. It is a
//! single synchronous pass over a [`KeyValueStorage`] port, so the host
//! decides how it is scheduled (start, focus, timer) and how its errors are
//! reported.
//!
//! # Example
//!
//! ```rust
//! use ezcentials_core::sync::{KeyValueStorage, MemoryStorage, PassOutcome, reconcile};
//!
//! let storage = MemoryStorage::new();
//! storage.set("localOrders", r#"[{"id":"A","paymentStatus":"pending"}]"#).unwrap();
//! storage.set("orderStatusUpdates", r#"{"A":"completed"}"#).unwrap();
//!
//! let mut seen = Vec::new();
//! let outcome = reconcile(&storage, |change| seen.push(change.clone())).unwrap();
//!
//! assert!(matches!(outcome, PassOutcome::Reconciled(_)));
//! assert_eq!(seen.len(), 1);
//! assert_eq!(storage.get("orderStatusUpdates").as_deref(), Some("{}"));
//! ```

mod ledger;
mod memory;
mod reconcile;
mod updates;

use std::time::Duration;

use thiserror::Error;

pub use ledger::{
    LedgerError, load_local_orders, load_status_updates, place_order, record_status_update,
};
pub use memory::MemoryStorage;
pub use reconcile::{PassOutcome, PassSummary, ReconcileError, reconcile};
pub use updates::StatusUpdateMap;

/// Storage key of the cached order list.
pub const LOCAL_ORDERS_KEY: &str = "localOrders";

/// Storage key of the pending status updates.
pub const STATUS_UPDATES_KEY: &str = "orderStatusUpdates";

/// How often the host re-runs the pass when nothing else triggers it.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(15);

/// A write to the key-value store failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageWriteError {
    /// The store is full.
    #[error("storage quota exceeded ({required} bytes needed, limit {limit})")]
    QuotaExceeded { limit: usize, required: usize },

    /// The backing medium rejected the write.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Port to an origin-scoped persistent string key-value store.
///
/// Mirrors the browser storage contract: reads never fail (an unreadable
/// value is simply absent) while writes may be refused.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageWriteError`] if the value could not be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageWriteError>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageWriteError> {
        (**self).set(key, value)
    }
}
