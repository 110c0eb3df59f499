//! Background driver for the local order status reconciliation pass.
//!
//! [`OrderStatusSyncer::start`] runs one pass immediately, then re-runs it
//! whenever the focus signal fires and on a repeating timer. All passes run
//! on a single task so they never interleave, and each pass holds the
//! [`OrderStore`] lock so it never overlaps a handler's write. Applied
//! status changes are forwarded to a broadcast channel for live UI refresh.

use std::sync::Arc;
use std::time::Duration;

use ezcentials_core::StatusChange;
use ezcentials_core::sync::{PassOutcome, ReconcileError};
use tokio::sync::{Notify, broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::order_store::OrderStore;

/// Runs reconciliation passes against one origin's storage.
#[derive(Clone)]
pub struct OrderStatusSyncer {
    orders: OrderStore,
    events: broadcast::Sender<StatusChange>,
    focus: Arc<Notify>,
    interval: Duration,
}

impl OrderStatusSyncer {
    /// Create a syncer.
    ///
    /// `focus` is the signal that stands in for the window regaining focus;
    /// call `notify_one` on it to request an immediate pass.
    #[must_use]
    pub fn new(
        orders: OrderStore,
        events: broadcast::Sender<StatusChange>,
        focus: Arc<Notify>,
        interval: Duration,
    ) -> Self {
        Self {
            orders,
            events,
            focus,
            interval,
        }
    }

    /// Run one pass and report its outcome through tracing.
    ///
    /// Every applied change is published to subscribers. Errors are logged
    /// and returned; the next trigger simply tries again.
    ///
    /// # Errors
    ///
    /// Returns the pass error after logging it.
    pub fn run_pass(&self) -> Result<PassOutcome, ReconcileError> {
        let result = self.orders.reconcile(|change| {
            // No subscribers is fine, the order list is still updated.
            let _ = self.events.send(change.clone());
        });

        match &result {
            Ok(PassOutcome::Reconciled(summary)) => {
                if summary.orders_changed() {
                    info!(
                        applied = summary.applied.len(),
                        "Order statuses synchronized"
                    );
                }
                if !summary.unmatched.is_empty() {
                    debug!(
                        unmatched = ?summary.unmatched,
                        "Dropped status updates without a local order"
                    );
                }
                if !summary.invalid.is_empty() {
                    warn!(
                        invalid = ?summary.invalid,
                        "Dropped status updates with an unknown status"
                    );
                }
            }
            Ok(PassOutcome::Idle) => debug!("No pending order status updates"),
            Ok(PassOutcome::MissingKey(key)) => debug!(key, "Order storage slot not set"),
            Err(ReconcileError::Write { key, source, applied }) => error!(
                key,
                error = %source,
                applied = applied.len(),
                "Failed to persist synchronized order statuses"
            ),
            Err(e) => error!(error = %e, "Failed to synchronize order statuses"),
        }

        result
    }

    /// Run the initial pass and start the focus and timer triggers.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(self) -> SyncHandle {
        let _ = self.run_pass();

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    _ = &mut shutdown_rx => break,

                    () = self.focus.notified() => {
                        debug!("Focus regained, synchronizing order statuses");
                        let _ = self.run_pass();
                    }

                    _ = ticker.tick() => {
                        let _ = self.run_pass();
                    }
                }
            }
        });

        info!(interval_secs = period.as_secs(), "Order status sync started");

        SyncHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Registration of the running triggers.
///
/// Dropping the handle aborts the task; [`SyncHandle::stop`] shuts it down
/// and waits, after which no pass will start.
pub struct SyncHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Whether the trigger task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the timer and focus triggers together.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            warn!(error = %e, "Order status sync task ended abnormally");
        }
        info!("Order status sync stopped");
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ezcentials_core::sync::{
        KeyValueStorage, LOCAL_ORDERS_KEY, MemoryStorage, STATUS_UPDATES_KEY, load_local_orders, place_order,
        record_status_update,
    };
    use ezcentials_core::{LocalOrder, OrderId, PaymentStatus, TerminalStatus};

    struct Fixture {
        storage: Arc<MemoryStorage>,
        events: broadcast::Receiver<StatusChange>,
        focus: Arc<Notify>,
        syncer: OrderStatusSyncer,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let (tx, rx) = broadcast::channel(16);
        let focus = Arc::new(Notify::new());
        let syncer = OrderStatusSyncer::new(
            OrderStore::new(storage.clone()),
            tx,
            focus.clone(),
            Duration::from_secs(15),
        );
        Fixture {
            storage,
            events: rx,
            focus,
            syncer,
        }
    }

    fn status_of(storage: &MemoryStorage, id: &str) -> PaymentStatus {
        load_local_orders(storage)
            .unwrap()
            .into_iter()
            .find(|o| o.id.as_str() == id)
            .unwrap()
            .payment_status
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_initial_pass() {
        let mut f = fixture();
        place_order(f.storage.as_ref(), LocalOrder::new(OrderId::new("A"))).unwrap();
        record_status_update(f.storage.as_ref(), OrderId::new("A"), TerminalStatus::Completed)
            .unwrap();

        let handle = f.syncer.start();

        assert_eq!(status_of(&f.storage, "A"), PaymentStatus::Completed);
        let change = f.events.try_recv().unwrap();
        assert_eq!(change.order_id.as_str(), "A");
        assert_eq!(change.new_status, TerminalStatus::Completed);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_applies_later_updates() {
        let f = fixture();
        place_order(f.storage.as_ref(), LocalOrder::new(OrderId::new("A"))).unwrap();
        let handle = f.syncer.start();

        record_status_update(f.storage.as_ref(), OrderId::new("A"), TerminalStatus::Rejected)
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(status_of(&f.storage, "A"), PaymentStatus::Pending);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(status_of(&f.storage, "A"), PaymentStatus::Rejected);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_triggers_pass() {
        let f = fixture();
        place_order(f.storage.as_ref(), LocalOrder::new(OrderId::new("A"))).unwrap();
        let handle = f.syncer.start();

        record_status_update(f.storage.as_ref(), OrderId::new("A"), TerminalStatus::Completed)
            .unwrap();
        f.focus.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(status_of(&f.storage, "A"), PaymentStatus::Completed);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pass_after_stop() {
        let f = fixture();
        place_order(f.storage.as_ref(), LocalOrder::new(OrderId::new("A"))).unwrap();
        let handle = f.syncer.start();
        assert!(handle.is_running());
        handle.stop().await;

        record_status_update(f.storage.as_ref(), OrderId::new("A"), TerminalStatus::Completed)
            .unwrap();
        f.focus.notify_one();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(status_of(&f.storage, "A"), PaymentStatus::Pending);
        assert_eq!(
            f.storage.get(STATUS_UPDATES_KEY).as_deref(),
            Some(r#"{"A":"completed"}"#)
        );
    }

    #[tokio::test]
    async fn test_run_pass_reports_decode_error() {
        let f = fixture();
        f.storage.set(LOCAL_ORDERS_KEY, "not json").unwrap();
        f.storage.set(STATUS_UPDATES_KEY, r#"{"A":"completed"}"#).unwrap();

        let result = f.syncer.run_pass();

        assert!(matches!(result, Err(ReconcileError::Decode { .. })));
        assert_eq!(f.storage.get(LOCAL_ORDERS_KEY).as_deref(), Some("not json"));
    }
}
