//! # Records
//!
//! A record is a strongly-typed identity/timestamp header plus an ordered
//! map of caller-defined fields.
//!
//! ## Record Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Record                                                                 │
//! │  ─────────────────────────────────────                                 │
//! │  id          "3f2a..."      (immutable, unique per table)              │
//! │  created_at  2026-10-19T…   (set once by the store)                    │
//! │  updated_at  2026-10-19T…   (bumped on every mutation)                 │
//! │  fields      { name: "Chair", price: 50, stock: 3 }                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On disk the header and the fields are flattened into one JSON object,
//! which is the shape the storefront already reads.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Caller-defined fields of a record.
pub type Fields = BTreeMap<String, Value>;

/// Field names owned by the store. Callers cannot set them directly.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

static NULL: Value = Value::Null;

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque identifier, unique within its table.
    pub id: String,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,

    /// Everything else.
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Returns a caller-defined field, if present.
    #[inline]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the value of any field, header included.
    ///
    /// Missing fields read as `Null`, so conditions and indexes treat an
    /// absent field and an explicit `null` the same way.
    pub fn value(&self, field: &str) -> Cow<'_, Value> {
        match field {
            "id" => Cow::Owned(Value::String(self.id.clone())),
            "created_at" => Cow::Owned(Value::String(format_timestamp(&self.created_at))),
            "updated_at" => Cow::Owned(Value::String(format_timestamp(&self.updated_at))),
            _ => Cow::Borrowed(self.fields.get(field).unwrap_or(&NULL)),
        }
    }

    /// Header and fields as one map, in persisted order of keys.
    pub fn to_flat_map(&self) -> BTreeMap<String, Value> {
        let mut map = self.fields.clone();
        for name in RESERVED_FIELDS {
            map.insert(name.to_string(), self.value(name).into_owned());
        }
        map
    }
}

/// RFC 3339 with nanoseconds, the format timestamps are compared in.
///
/// Fixed width, so string order matches time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Builds a field map from a JSON object.
///
/// Anything other than an object yields an empty map.
///
/// ## Example
/// ```rust
/// use mobilia_core::record::fields_from_json;
/// use serde_json::json;
///
/// let fields = fields_from_json(json!({ "name": "Chair", "price": 50 }));
/// assert_eq!(fields.len(), 2);
/// ```
pub fn fields_from_json(json: serde_json::Value) -> Fields {
    match Value::from(json) {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Record {
        let now = Utc::now();
        Record {
            id: "chair-1".to_string(),
            created_at: now,
            updated_at: now,
            fields: fields_from_json(json!({ "name": "Chair", "price": 50, "stock": 3 })),
        }
    }

    #[test]
    fn test_flattened_round_trip() {
        let record = sample();
        let text = serde_json::to_string(&record).unwrap();
        assert!(text.contains(r#""id":"chair-1""#));
        assert!(text.contains(r#""name":"Chair""#));
        assert!(!text.contains("fields"));

        let back: Record = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_value_reads_header_and_missing() {
        let record = sample();
        assert_eq!(record.value("id").as_ref(), &Value::from("chair-1"));
        assert_eq!(record.value("price").as_ref(), &Value::from(50));
        assert!(record.value("colour").is_null());
    }

    #[test]
    fn test_flat_map_contains_header() {
        let map = sample().to_flat_map();
        assert!(map.contains_key("id"));
        assert!(map.contains_key("created_at"));
        assert!(map.contains_key("updated_at"));
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn test_sub_microsecond_timestamps_stay_ordered() {
        let earlier = sample();
        let mut later = earlier.clone();
        later.updated_at = earlier.updated_at + chrono::Duration::nanoseconds(500);

        let a = earlier.value("updated_at");
        let b = later.value("updated_at");
        assert_eq!(b.compare(&a), Some(std::cmp::Ordering::Greater));
        assert_ne!(a.index_key(), b.index_key());
    }

    #[test]
    fn test_fields_from_non_object() {
        assert!(fields_from_json(json!([1, 2])).is_empty());
    }
}
