//! Local order cache commands.
//!
//! These work on the same origin file the storefront reads, so an order
//! placed or decided here shows up on the next storefront sync pass.

use ezcentials_core::sync::{
    KeyValueStorage, LedgerError, PassOutcome, ReconcileError, load_local_orders,
    load_status_updates, place_order, reconcile, record_status_update,
};
use ezcentials_core::{LocalOrder, OrderId, TerminalStatus};
use ezcentials_storefront::config::StorefrontConfig;
use ezcentials_storefront::storage::{FileStorage, StorageError};
use thiserror::Error;
use tracing::info;

/// Errors from the order commands.
#[derive(Debug, Error)]
pub enum OrdersError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("sync failed: {0}")]
    Sync(#[from] ReconcileError),
}

/// Open the storage file of the configured origin.
///
/// # Errors
///
/// Returns an error if the origin is invalid or the directory cannot be
/// created.
pub fn open_storage(config: &StorefrontConfig) -> Result<FileStorage, OrdersError> {
    let storage = FileStorage::for_origin(
        &config.storage_dir,
        &config.origin,
        config.storage_quota_bytes,
    )?;
    info!(path = %storage.path().display(), "Using order storage");
    Ok(storage)
}

/// List cached orders followed by pending decisions.
///
/// # Errors
///
/// Returns an error if either slot holds malformed JSON.
pub fn list(storage: &dyn KeyValueStorage) -> Result<Vec<String>, OrdersError> {
    let orders = load_local_orders(storage)?;
    let updates = load_status_updates(storage)?;

    let mut lines = Vec::with_capacity(orders.len() + updates.len() + 1);
    if orders.is_empty() {
        lines.push("No cached orders.".to_string());
    }
    lines.extend(
        orders
            .iter()
            .map(|order| format!("{:<24} {}", order.id.as_str(), order.payment_status)),
    );
    lines.extend(
        updates
            .iter()
            .map(|(id, status)| format!("{:<24} -> {status} (pending sync)", id.as_str())),
    );
    Ok(lines)
}

/// Place a new pending order.
///
/// # Errors
///
/// Returns an error if the id is already cached or the write fails.
pub fn place(storage: &dyn KeyValueStorage, id: &str) -> Result<Vec<String>, OrdersError> {
    let order = LocalOrder::new(OrderId::new(id));
    place_order(storage, order)?;
    info!(order_id = id, "Order placed");
    Ok(vec![format!("Placed order {id}")])
}

/// Record a payment decision for the next sync pass.
///
/// # Errors
///
/// Returns an error if the pending map is malformed or the write fails.
pub fn decide(
    storage: &dyn KeyValueStorage,
    id: &str,
    status: TerminalStatus,
) -> Result<Vec<String>, OrdersError> {
    record_status_update(storage, OrderId::new(id), status)?;
    info!(order_id = id, %status, "Status update recorded");
    Ok(vec![format!("Recorded {status} for order {id}")])
}

/// Run one reconciliation pass and report what it did.
///
/// # Errors
///
/// Returns an error if a slot is malformed or the write-back fails.
pub fn sync(storage: &dyn KeyValueStorage) -> Result<Vec<String>, OrdersError> {
    let mut lines = Vec::new();
    let outcome = reconcile(storage, |change| {
        lines.push(format!("{} -> {}", change.order_id, change.new_status));
    })?;

    match outcome {
        PassOutcome::MissingKey(key) => lines.push(format!("Nothing to sync: `{key}` is empty")),
        PassOutcome::Idle => lines.push("Nothing to sync".to_string()),
        PassOutcome::Reconciled(summary) => {
            lines.extend(
                summary
                    .already_current
                    .iter()
                    .map(|id| format!("{id} already up to date")),
            );
            lines.extend(
                summary
                    .unmatched
                    .iter()
                    .map(|id| format!("{id} not found, update dropped")),
            );
            lines.extend(
                summary
                    .invalid
                    .iter()
                    .map(|id| format!("{id} has an unknown status, update dropped")),
            );
            lines.push(format!("Consumed {} update(s)", summary.consumed()));
        }
    }
    Ok(lines)
}
