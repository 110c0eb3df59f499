//! Ordered map of pending status updates.

use core::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{OrderId, TerminalStatus};

/// Pending status updates keyed by order id, in object key order.
///
/// Entries follow JavaScript property order: integer-like ids (`"7"`,
/// `"1001"`) first in ascending numeric order, then every other id in the
/// order it was first seen. A pass applies them (and notifies observers)
/// in that order. A duplicated key keeps its first position and its last
/// value, like `JSON.parse`.
///
/// Entries whose value is not a terminal status are set aside when
/// decoding (see [`StatusUpdateMap::take_invalid`]) and never written back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdateMap {
    entries: Vec<(OrderId, TerminalStatus)>,
    invalid: Vec<OrderId>,
}

impl StatusUpdateMap {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            invalid: Vec::new(),
        }
    }

    /// Number of pending updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no update is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Status pending for an order.
    #[must_use]
    pub fn get(&self, order_id: &str) -> Option<TerminalStatus> {
        self.entries
            .iter()
            .find(|(id, _)| id.as_str() == order_id)
            .map(|(_, status)| *status)
    }

    /// Insert or replace the pending status of an order.
    ///
    /// Replacing keeps the entry's original position.
    pub fn insert(&mut self, order_id: OrderId, status: TerminalStatus) {
        if let Some(entry) = self.entries.iter_mut().find(|(id, _)| *id == order_id) {
            entry.1 = status;
            return;
        }
        let position = match array_index(order_id.as_str()) {
            Some(index) => self
                .entries
                .iter()
                .position(|(id, _)| array_index(id.as_str()).is_none_or(|other| other > index))
                .unwrap_or(self.entries.len()),
            None => self.entries.len(),
        };
        self.entries.insert(position, (order_id, status));
    }

    /// Iterate over the pending updates in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&OrderId, TerminalStatus)> {
        self.entries.iter().map(|(id, status)| (id, *status))
    }

    /// Ids whose stored value was not a terminal status.
    #[must_use]
    pub fn invalid(&self) -> &[OrderId] {
        &self.invalid
    }

    /// Take the ids of undecodable entries out of the map.
    pub fn take_invalid(&mut self) -> Vec<OrderId> {
        std::mem::take(&mut self.invalid)
    }

    /// Take every entry out of the map, leaving it empty.
    pub fn drain(&mut self) -> impl Iterator<Item = (OrderId, TerminalStatus)> + '_ {
        self.entries.drain(..)
    }
}

/// The numeric value of a canonical array-index key (`"0"`, `"42"`, but not
/// `"042"`, `"+1"` or `"4294967295"`).
fn array_index(key: &str) -> Option<u32> {
    key.parse::<u32>()
        .ok()
        .filter(|&index| index != u32::MAX && index.to_string() == key)
}

impl FromIterator<(OrderId, TerminalStatus)> for StatusUpdateMap {
    fn from_iter<I: IntoIterator<Item = (OrderId, TerminalStatus)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, status) in iter {
            map.insert(id, status);
        }
        map
    }
}

impl Serialize for StatusUpdateMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, status) in &self.entries {
            map.serialize_entry(id, status)?;
        }
        map.end()
    }
}

/// A stored map value: a terminal status or anything else.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredStatus {
    Terminal(TerminalStatus),
    Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for StatusUpdateMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UpdatesVisitor;

        impl<'de> Visitor<'de> for UpdatesVisitor {
            type Value = StatusUpdateMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping order ids to \"completed\" or \"rejected\"")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = StatusUpdateMap::new();
                while let Some((id, value)) = access.next_entry::<OrderId, StoredStatus>()? {
                    match value {
                        StoredStatus::Terminal(status) => {
                            map.invalid.retain(|invalid| *invalid != id);
                            map.insert(id, status);
                        }
                        StoredStatus::Other(IgnoredAny) => {
                            map.entries.retain(|(entry, _)| *entry != id);
                            if !map.invalid.contains(&id) {
                                map.invalid.push(id);
                            }
                        }
                    }
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(UpdatesVisitor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_document_order() {
        let map: StatusUpdateMap =
            serde_json::from_str(r#"{"zeta":"completed","alpha":"rejected","mid":"completed"}"#)
                .unwrap();
        let ids: Vec<&str> = map.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["zeta", "alpha", "mid"]);
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"zeta":"completed","alpha":"rejected","mid":"completed"}"#
        );
    }

    #[test]
    fn test_integer_like_ids_come_first_in_numeric_order() {
        let map: StatusUpdateMap = serde_json::from_str(
            r#"{"1001":"completed","b":"rejected","999":"completed","042":"rejected","a":"completed"}"#,
        )
        .unwrap();
        let ids: Vec<&str> = map.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["999", "1001", "b", "042", "a"]);
    }

    #[test]
    fn test_insert_places_numeric_id_before_named_ids() {
        let mut map = StatusUpdateMap::new();
        map.insert(OrderId::new("ORD-1"), TerminalStatus::Completed);
        map.insert(OrderId::new("20"), TerminalStatus::Completed);
        map.insert(OrderId::new("3"), TerminalStatus::Rejected);
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"3":"rejected","20":"completed","ORD-1":"completed"}"#
        );
    }

    #[test]
    fn test_duplicate_key_keeps_position_and_last_value() {
        let map: StatusUpdateMap =
            serde_json::from_str(r#"{"A":"completed","B":"completed","A":"rejected"}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("A"), Some(TerminalStatus::Rejected));
        assert_eq!(map.iter().next().map(|(id, _)| id.as_str()), Some("A"));
    }

    #[test]
    fn test_sets_aside_non_terminal_status() {
        let mut map: StatusUpdateMap =
            serde_json::from_str(r#"{"A":"pending","B":"completed","C":3}"#).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("B"), Some(TerminalStatus::Completed));
        assert_eq!(map.invalid(), [OrderId::new("A"), OrderId::new("C")]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"B":"completed"}"#);

        assert_eq!(map.take_invalid().len(), 2);
        assert!(map.invalid().is_empty());
    }

    #[test]
    fn test_last_duplicate_decides_validity() {
        let map: StatusUpdateMap =
            serde_json::from_str(r#"{"A":"refunded","A":"completed","B":"rejected","B":"?"}"#)
                .unwrap();
        assert_eq!(map.get("A"), Some(TerminalStatus::Completed));
        assert_eq!(map.get("B"), None);
        assert_eq!(map.invalid(), [OrderId::new("B")]);
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(serde_json::from_str::<StatusUpdateMap>("[]").is_err());
        assert!(serde_json::from_str::<StatusUpdateMap>(r#""A""#).is_err());
    }

    #[test]
    fn test_empty_map_serializes_as_empty_object() {
        assert_eq!(
            serde_json::to_string(&StatusUpdateMap::new()).unwrap(),
            "{}"
        );
    }
}
