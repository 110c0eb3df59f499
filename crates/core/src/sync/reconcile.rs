//! The local order status reconciliation pass.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{KeyValueStorage, LOCAL_ORDERS_KEY, STATUS_UPDATES_KEY, StatusUpdateMap, StorageWriteError};
use crate::{LocalOrder, OrderId, PaymentStatus, StatusChange};

/// Errors that abort or degrade a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A storage slot did not hold valid JSON. Nothing was applied.
    #[error("failed to decode `{key}`: {source}")]
    Decode {
        key: &'static str,
        source: serde_json::Error,
    },

    /// The reconciled state could not be serialized. Nothing was written.
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: &'static str,
        source: serde_json::Error,
    },

    /// Writing the reconciled state back failed.
    ///
    /// Observers have already been notified; the stored state may lag
    /// behind until the next pass.
    #[error("failed to write `{key}`: {source}")]
    Write {
        key: &'static str,
        source: StorageWriteError,
        /// Changes that were applied in memory before the write failed.
        applied: Vec<StatusChange>,
    },
}

/// What a pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// A storage slot was absent or empty; storage was not touched.
    MissingKey(&'static str),
    /// No update was pending; storage was not touched.
    Idle,
    /// Pending updates were consumed and written back.
    Reconciled(PassSummary),
}

/// Per-entry result of a pass that consumed updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Updates applied to an order, in notification order.
    pub applied: Vec<StatusChange>,
    /// Updates whose order already had the requested status.
    pub already_current: Vec<OrderId>,
    /// Updates with no matching order.
    pub unmatched: Vec<OrderId>,
    /// Updates whose value was not a terminal status.
    pub invalid: Vec<OrderId>,
}

impl PassSummary {
    /// Whether any order status was changed.
    #[must_use]
    pub fn orders_changed(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Number of updates consumed by the pass.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.applied.len() + self.already_current.len() + self.unmatched.len() + self.invalid.len()
    }
}

/// An entry of the order list.
///
/// Entries that are not a well-formed [`LocalOrder`] (an unknown or missing
/// `paymentStatus`, say) are carried as raw JSON so they survive the pass
/// and can still be matched by `id`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredOrder {
    Known(LocalOrder),
    Raw(Value),
}

impl StoredOrder {
    fn id(&self) -> Option<&str> {
        match self {
            Self::Known(order) => Some(order.id.as_str()),
            Self::Raw(value) => value.get("id").and_then(Value::as_str),
        }
    }

    /// Set the payment status, returning whether it changed.
    fn set_status(&mut self, status: PaymentStatus) -> bool {
        match self {
            Self::Known(order) => {
                let changed = order.payment_status != status;
                order.payment_status = status;
                changed
            }
            Self::Raw(value) => {
                let Some(fields) = value.as_object_mut() else {
                    return false;
                };
                let status = Value::String(status.to_string());
                let changed = fields.get("paymentStatus") != Some(&status);
                fields.insert("paymentStatus".to_string(), status);
                changed
            }
        }
    }
}

/// Run one reconciliation pass over `storage`.
///
/// Reads both slots, applies every pending update to the matching order and
/// calls `on_status_update` once per changed order, synchronously and in
/// map order. Every pending entry is consumed whether or not it matched an
/// order; entries whose value is not a terminal status are dropped without
/// notification, and orders the pass does not understand are kept as-is
/// unless an update targets their id.
///
/// Storage is written only when something was consumed: the order list
/// when at least one status changed, the pending map (now empty) whenever
/// it had entries. Orders are written first so a refused write leaves the
/// updates in place for the next pass.
///
/// # Errors
///
/// - [`ReconcileError::Decode`] if either slot holds malformed JSON; no
///   observer is called and storage is untouched.
/// - [`ReconcileError::Write`] if persisting the result fails; no rollback
///   is attempted.
pub fn reconcile<S, F>(storage: &S, mut on_status_update: F) -> Result<PassOutcome, ReconcileError>
where
    S: KeyValueStorage + ?Sized,
    F: FnMut(&StatusChange),
{
    let Some(orders_json) = read_slot(storage, LOCAL_ORDERS_KEY) else {
        return Ok(PassOutcome::MissingKey(LOCAL_ORDERS_KEY));
    };
    let Some(updates_json) = read_slot(storage, STATUS_UPDATES_KEY) else {
        return Ok(PassOutcome::MissingKey(STATUS_UPDATES_KEY));
    };

    let mut orders: Vec<StoredOrder> =
        serde_json::from_str(&orders_json).map_err(|source| ReconcileError::Decode {
            key: LOCAL_ORDERS_KEY,
            source,
        })?;
    let mut updates: StatusUpdateMap =
        serde_json::from_str(&updates_json).map_err(|source| ReconcileError::Decode {
            key: STATUS_UPDATES_KEY,
            source,
        })?;

    let invalid = updates.take_invalid();
    if updates.is_empty() && invalid.is_empty() {
        return Ok(PassOutcome::Idle);
    }

    let mut summary = PassSummary {
        invalid,
        ..PassSummary::default()
    };
    for (order_id, new_status) in updates.drain() {
        let Some(order) = orders
            .iter_mut()
            .find(|order| order.id() == Some(order_id.as_str()))
        else {
            summary.unmatched.push(order_id);
            continue;
        };
        if order.set_status(new_status.into()) {
            let change = StatusChange {
                order_id,
                new_status,
            };
            on_status_update(&change);
            summary.applied.push(change);
        } else {
            summary.already_current.push(order_id);
        }
    }

    if summary.orders_changed() {
        write_slot(storage, LOCAL_ORDERS_KEY, &orders, &summary)?;
    }
    write_slot(storage, STATUS_UPDATES_KEY, &updates, &summary)?;

    Ok(PassOutcome::Reconciled(summary))
}

/// An empty string is treated like an absent slot.
fn read_slot<S: KeyValueStorage + ?Sized>(storage: &S, key: &str) -> Option<String> {
    storage.get(key).filter(|value| !value.is_empty())
}

fn write_slot<S, T>(
    storage: &S,
    key: &'static str,
    value: &T,
    summary: &PassSummary,
) -> Result<(), ReconcileError>
where
    S: KeyValueStorage + ?Sized,
    T: serde::Serialize,
{
    let json =
        serde_json::to_string(value).map_err(|source| ReconcileError::Encode { key, source })?;
    storage
        .set(key, &json)
        .map_err(|source| ReconcileError::Write {
            key,
            source,
            applied: summary.applied.clone(),
        })
}
