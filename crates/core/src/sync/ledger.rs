//! Writers for the two order slots.
//!
//! The checkout flow appends to the order list and the confirmation pages
//! record decisions in the pending map. Neither touches the other's slot.

use thiserror::Error;

use super::{KeyValueStorage, LOCAL_ORDERS_KEY, STATUS_UPDATES_KEY, StatusUpdateMap, StorageWriteError};
use crate::{LocalOrder, OrderId, TerminalStatus};

/// Errors from reading or writing the order slots.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The stored value is not valid JSON for the slot.
    #[error("failed to decode `{key}`: {source}")]
    Decode {
        key: &'static str,
        source: serde_json::Error,
    },

    /// The new value could not be serialized.
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: &'static str,
        source: serde_json::Error,
    },

    /// The store refused the write.
    #[error("failed to write `{key}`: {source}")]
    Write {
        key: &'static str,
        source: StorageWriteError,
    },

    /// An order with this id is already cached.
    #[error("order already exists: {0}")]
    DuplicateOrder(OrderId),
}

/// Read the cached order list. An absent slot is an empty list.
///
/// # Errors
///
/// Returns [`LedgerError::Decode`] if the slot holds malformed JSON.
pub fn load_local_orders<S: KeyValueStorage + ?Sized>(
    storage: &S,
) -> Result<Vec<LocalOrder>, LedgerError> {
    load(storage, LOCAL_ORDERS_KEY)
}

/// Read the pending status updates. An absent slot is an empty map.
///
/// # Errors
///
/// Returns [`LedgerError::Decode`] if the slot holds malformed JSON.
pub fn load_status_updates<S: KeyValueStorage + ?Sized>(
    storage: &S,
) -> Result<StatusUpdateMap, LedgerError> {
    load(storage, STATUS_UPDATES_KEY)
}

/// Append a newly placed order to the cached list.
///
/// # Errors
///
/// Returns [`LedgerError::DuplicateOrder`] if the id is already cached, or a
/// decode/write error from the store.
pub fn place_order<S: KeyValueStorage + ?Sized>(
    storage: &S,
    order: LocalOrder,
) -> Result<(), LedgerError> {
    let mut orders = load_local_orders(storage)?;
    if orders.iter().any(|o| o.id == order.id) {
        return Err(LedgerError::DuplicateOrder(order.id));
    }
    orders.push(order);
    save(storage, LOCAL_ORDERS_KEY, &orders)
}

/// Record a payment decision for the next reconciliation pass to pick up.
///
/// A decision already pending for the same order is replaced.
///
/// # Errors
///
/// Returns a decode/write error from the store.
pub fn record_status_update<S: KeyValueStorage + ?Sized>(
    storage: &S,
    order_id: OrderId,
    status: TerminalStatus,
) -> Result<(), LedgerError> {
    let mut updates = load_status_updates(storage)?;
    updates.insert(order_id, status);
    save(storage, STATUS_UPDATES_KEY, &updates)
}

fn load<S, T>(storage: &S, key: &'static str) -> Result<T, LedgerError>
where
    S: KeyValueStorage + ?Sized,
    T: serde::de::DeserializeOwned + Default,
{
    match storage.get(key).filter(|raw| !raw.is_empty()) {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| LedgerError::Decode { key, source }),
        None => Ok(T::default()),
    }
}

fn save<S, T>(storage: &S, key: &'static str, value: &T) -> Result<(), LedgerError>
where
    S: KeyValueStorage + ?Sized,
    T: serde::Serialize,
{
    let json = serde_json::to_string(value).map_err(|source| LedgerError::Encode { key, source })?;
    storage
        .set(key, &json)
        .map_err(|source| LedgerError::Write { key, source })
}
