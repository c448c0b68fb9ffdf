//! # Record Codec
//!
//! Turns caller input into records and tables into persisted blobs.
//!
//! ## Responsibilities
//! - assign `id` (caller-supplied or UUID v4) on create
//! - stamp `created_at` / `updated_at`; callers never set them
//! - merge partial updates without touching the id
//! - encode / decode a table's JSON array blob

use chrono::{DateTime, Duration, Utc};
use mobilia_core::{Fields, Record, Value};
use tracing::warn;
use uuid::Uuid;

use crate::error::StoreResult;

/// Generates a fresh record id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Removes a caller-supplied `id` from the fields, if any.
///
/// Numbers are accepted and stringified; `null` counts as absent.
pub fn take_id(fields: &mut Fields) -> Option<String> {
    match fields.remove("id")? {
        Value::Null => None,
        Value::String(id) => Some(id),
        other => Some(other.to_string()),
    }
}

/// Drops store-owned fields from caller input.
///
/// Returns the names that were dropped.
pub fn strip_reserved(table: &str, fields: &mut Fields) -> Vec<&'static str> {
    let mut dropped = Vec::new();
    for name in mobilia_core::RESERVED_FIELDS {
        if fields.remove(name).is_some() {
            dropped.push(name);
        }
    }
    if !dropped.is_empty() {
        warn!(table, fields = ?dropped, "Ignoring store-owned fields in caller input");
    }
    dropped
}

/// Builds a new record. `fields` must already be free of reserved names.
pub fn new_record(id: String, fields: Fields) -> Record {
    let now = Utc::now();
    Record {
        id,
        created_at: now,
        updated_at: now,
        fields,
    }
}

/// Returns a timestamp strictly after `previous`.
///
/// Falls back to `previous + 1µs` when the clock has not advanced.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Merges `partial` into a copy of `record` and bumps `updated_at`.
///
/// An `id` in `partial` is ignored: ids never change.
pub fn merge(table: &str, record: &Record, mut partial: Fields) -> Record {
    partial.remove("id");
    strip_reserved(table, &mut partial);
    let mut updated = record.clone();
    updated.fields.extend(partial);
    updated.updated_at = next_timestamp(record.updated_at);
    updated
}

/// Decodes a table blob. An empty blob is an empty table.
pub fn decode_table(blob: &str) -> StoreResult<Vec<Record>> {
    if blob.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(blob)?)
}

/// Encodes records, in order, as a JSON array blob.
pub fn encode_table<'a, I>(records: I) -> StoreResult<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let records: Vec<&Record> = records.into_iter().collect();
    Ok(serde_json::to_string(&records)?)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mobilia_core::fields_from_json;
    use serde_json::json;

    #[test]
    fn test_take_id_variants() {
        let mut fields = fields_from_json(json!({ "id": "sofa-1", "name": "Sofa" }));
        assert_eq!(take_id(&mut fields).as_deref(), Some("sofa-1"));
        assert!(!fields.contains_key("id"));

        let mut fields = fields_from_json(json!({ "id": 42 }));
        assert_eq!(take_id(&mut fields).as_deref(), Some("42"));

        let mut fields = fields_from_json(json!({ "id": null }));
        assert_eq!(take_id(&mut fields), None);

        let mut fields = fields_from_json(json!({ "name": "Sofa" }));
        assert_eq!(take_id(&mut fields), None);
    }

    #[test]
    fn test_strip_reserved() {
        let mut fields = fields_from_json(json!({
            "created_at": "1999-01-01T00:00:00Z",
            "updated_at": "1999-01-01T00:00:00Z",
            "name": "Bed"
        }));
        let dropped = strip_reserved("products", &mut fields);
        assert_eq!(dropped, vec!["created_at", "updated_at"]);
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_merge_keeps_id_and_bumps_timestamp() {
        let record = new_record("bed-1".to_string(), fields_from_json(json!({ "stock": 1 })));
        let updated = merge(
            "products",
            &record,
            fields_from_json(json!({ "id": "other", "stock": 2, "colour": "oak" })),
        );

        assert_eq!(updated.id, "bed-1");
        assert!(updated.get("id").is_none());
        assert_eq!(updated.get("stock"), Some(&Value::from(2)));
        assert_eq!(updated.get("colour"), Some(&Value::from("oak")));
        assert!(updated.updated_at > record.updated_at);
        assert_eq!(updated.created_at, record.created_at);
    }

    #[test]
    fn test_next_timestamp_strictly_increases() {
        let future = Utc::now() + Duration::hours(1);
        assert_eq!(next_timestamp(future), future + Duration::microseconds(1));
        let past = Utc::now() - Duration::hours(1);
        assert!(next_timestamp(past) > past);
    }

    #[test]
    fn test_table_blob_round_trip() {
        let records = vec![
            new_record("a".to_string(), fields_from_json(json!({ "price": 50 }))),
            new_record("b".to_string(), fields_from_json(json!({ "tags": ["oak"] }))),
        ];
        let blob = encode_table(&records).unwrap();
        assert!(blob.starts_with('['));
        assert_eq!(decode_table(&blob).unwrap(), records);
        assert!(decode_table("  ").unwrap().is_empty());
        assert!(decode_table("{not json").is_err());
    }
}
