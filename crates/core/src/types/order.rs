//! Locally cached orders.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{OrderId, PaymentStatus, TerminalStatus};

/// A customer order cached in the `localOrders` storage slot.
///
/// Only `id` and `paymentStatus` are interpreted. Every other field written
/// by the checkout flow (line items, totals, timestamps) is carried through
/// `extra` untouched so a reconciliation pass never loses data it does not
/// understand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalOrder {
    pub id: OrderId,
    pub payment_status: PaymentStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocalOrder {
    /// Create a freshly placed order in the `pending` state.
    #[must_use]
    pub fn new(id: OrderId) -> Self {
        Self {
            id,
            payment_status: PaymentStatus::Pending,
            extra: Map::new(),
        }
    }
}

/// A status transition applied to a local order.
///
/// This is what observers of the reconciliation pass receive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub order_id: OrderId,
    pub new_status: TerminalStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = r#"{"id":"A","paymentStatus":"pending","total":"19.90","items":[{"sku":"x"}]}"#;
        let order: LocalOrder = serde_json::from_str(raw).unwrap();
        assert_eq!(order.id.as_str(), "A");
        assert_eq!(order.extra.len(), 2);

        let written = serde_json::to_value(&order).unwrap();
        assert_eq!(written["total"], "19.90");
        assert_eq!(written["items"][0]["sku"], "x");
        assert_eq!(written["paymentStatus"], "pending");
    }

    #[test]
    fn test_new_order_is_pending() {
        let order = LocalOrder::new(OrderId::new("B"));
        assert_eq!(
            serde_json::to_string(&order).unwrap(),
            r#"{"id":"B","paymentStatus":"pending"}"#
        );
    }
}
