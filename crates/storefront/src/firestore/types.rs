//! Wire types for the Firestore REST API.
//!
//! Field values use Firestore's tagged encoding (`{"stringValue": "..."}`,
//! `{"integerValue": "5"}`), so documents keep their fields as raw JSON and
//! expose typed accessors instead of deriving one enum for every value kind.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A Firestore document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, ending in the document id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// Document body holding only `fields`.
    #[must_use]
    pub fn with_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// The document id (last segment of the resource name).
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    #[must_use]
    pub fn string(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.get("stringValue")?.as_str()
    }

    /// Integer field. Firestore sends 64-bit integers as strings.
    #[must_use]
    pub fn integer(&self, field: &str) -> Option<i64> {
        match self.fields.get(field)?.get("integerValue")? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        let raw = self.fields.get(field)?.get("timestampValue")?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// One page of a collection listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    pub next_page_token: Option<String>,
}

/// Error body returned by Google APIs.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[must_use]
pub fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

#[must_use]
pub fn integer_value(value: i64) -> Value {
    json!({ "integerValue": value.to_string() })
}

#[must_use]
pub fn timestamp_value(value: DateTime<Utc>) -> Value {
    json!({ "timestampValue": value.to_rfc3339_opts(SecondsFormat::Micros, true) })
}
