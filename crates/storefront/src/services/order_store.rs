//! The origin's order slots as shared by request handlers and the syncer.
//!
//! Placing an order, recording a decision and a reconciliation pass each
//! read a slot, change it and write it back. Handlers and the sync task run
//! on different worker threads, so every such cycle takes the same lock;
//! otherwise a pass could write back a stale order list over one that a
//! handler had just extended. Writers in other processes (the CLI, another
//! storefront) are not covered: the last writer wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ezcentials_core::sync::{
    KeyValueStorage, LedgerError, PassOutcome, ReconcileError, StatusUpdateMap,
    load_local_orders, load_status_updates, place_order, reconcile, record_status_update,
};
use ezcentials_core::{LocalOrder, OrderId, StatusChange, TerminalStatus};

/// Serialized access to the order slots of one storage.
#[derive(Clone)]
pub struct OrderStore {
    storage: Arc<dyn KeyValueStorage>,
    lock: Arc<Mutex<()>>,
}

impl OrderStore {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// The underlying storage, for plain reads.
    #[must_use]
    pub fn storage(&self) -> &dyn KeyValueStorage {
        self.storage.as_ref()
    }

    /// The cached orders.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Decode`] if the slot holds malformed JSON.
    pub fn orders(&self) -> Result<Vec<LocalOrder>, LedgerError> {
        load_local_orders(self.storage())
    }

    /// The pending status updates.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Decode`] if the slot holds malformed JSON.
    pub fn status_updates(&self) -> Result<StatusUpdateMap, LedgerError> {
        load_status_updates(self.storage())
    }

    /// Append a newly placed order.
    ///
    /// # Errors
    ///
    /// See [`place_order`].
    pub fn place(&self, order: LocalOrder) -> Result<(), LedgerError> {
        let _guard = self.guard();
        place_order(self.storage(), order)
    }

    /// Record a payment decision for the next pass.
    ///
    /// # Errors
    ///
    /// See [`record_status_update`].
    pub fn record_status(
        &self,
        order_id: OrderId,
        status: TerminalStatus,
    ) -> Result<(), LedgerError> {
        let _guard = self.guard();
        record_status_update(self.storage(), order_id, status)
    }

    /// Run one reconciliation pass.
    ///
    /// `on_status_update` runs while the lock is held and must not call
    /// back into this store.
    ///
    /// # Errors
    ///
    /// See [`reconcile`].
    pub fn reconcile<F>(&self, on_status_update: F) -> Result<PassOutcome, ReconcileError>
    where
        F: FnMut(&StatusChange),
    {
        let _guard = self.guard();
        reconcile(self.storage(), on_status_update)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use ezcentials_core::PaymentStatus;
    use ezcentials_core::sync::MemoryStorage;

    use super::*;

    #[test]
    fn test_orders_placed_during_passes_are_kept() {
        const ORDERS: usize = 500;

        let store = OrderStore::new(Arc::new(MemoryStorage::new()));
        store.place(LocalOrder::new(OrderId::new("seed"))).unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let syncer = {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    store
                        .record_status(OrderId::new("seed"), TerminalStatus::Completed)
                        .unwrap();
                    store.reconcile(|_| {}).unwrap();
                }
            })
        };

        for i in 0..ORDERS {
            store
                .place(LocalOrder::new(OrderId::new(format!("ORD-{i}"))))
                .unwrap();
        }
        done.store(true, Ordering::Relaxed);
        syncer.join().unwrap();

        let orders = store.orders().unwrap();
        assert_eq!(orders.len(), ORDERS + 1);
        assert!(
            orders
                .iter()
                .filter(|o| o.id.as_str() != "seed")
                .all(|o| o.payment_status == PaymentStatus::Pending)
        );
    }

    #[test]
    fn test_decisions_recorded_during_passes_are_applied_or_pending() {
        let store = OrderStore::new(Arc::new(MemoryStorage::new()));
        for i in 0..50 {
            store
                .place(LocalOrder::new(OrderId::new(format!("ORD-{i}"))))
                .unwrap();
        }
        let done = Arc::new(AtomicBool::new(false));

        let syncer = {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    store.reconcile(|_| {}).unwrap();
                }
            })
        };

        for i in 0..50 {
            store
                .record_status(OrderId::new(format!("ORD-{i}")), TerminalStatus::Rejected)
                .unwrap();
        }
        done.store(true, Ordering::Relaxed);
        syncer.join().unwrap();
        store.reconcile(|_| {}).unwrap();

        let orders = store.orders().unwrap();
        assert!(
            orders
                .iter()
                .all(|o| o.payment_status == PaymentStatus::Rejected)
        );
        assert!(store.status_updates().unwrap().is_empty());
    }
}
