//! # Schema Inference
//!
//! Derives column types from records for export to a relational database.
//!
//! ## Type Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Field / value              →  ColumnType                              │
//! │  ─────────────────────────────────────────────                          │
//! │  id                         →  PrimaryKey                              │
//! │  created_at, updated_at     →  Timestamp                               │
//! │  Number with no fraction    →  Integer                                 │
//! │  Number with a fraction     →  Decimal                                 │
//! │  Bool                       →  Boolean                                 │
//! │  String, Null               →  Text                                    │
//! │  Array, Object              →  Json                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`infer_schema`] looks at one sample, so fields the sample lacks are
//! invisible. [`infer_table_schema`] reconciles every record instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::record::Record;
use crate::value::Value;

/// Column type descriptor consumed by SQL exporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    PrimaryKey,
    Timestamp,
    Integer,
    Decimal,
    Boolean,
    Text,
    Json,
}

/// Field name → column type.
pub type Schema = BTreeMap<String, ColumnType>;

/// Infers a schema from a single sample record.
pub fn infer_schema(sample: &Record) -> Schema {
    let mut schema = header_schema();
    for (field, value) in &sample.fields {
        schema.insert(field.clone(), column_type_of(value));
    }
    schema
}

/// Infers a schema from every record of a table.
///
/// ## Reconciliation
/// - `null` values do not vote
/// - Integer and Decimal observations widen to Decimal
/// - any other disagreement becomes Json
/// - a field that is `null` everywhere is Text
pub fn infer_table_schema(records: &[Record]) -> Schema {
    let mut observed: BTreeMap<String, Option<ColumnType>> = BTreeMap::new();

    for record in records {
        for (field, value) in &record.fields {
            let slot = observed.entry(field.clone()).or_insert(None);
            if value.is_null() {
                continue;
            }
            let seen = column_type_of(value);
            *slot = Some(match *slot {
                None => seen,
                Some(current) => widen(current, seen),
            });
        }
    }

    let mut schema = header_schema();
    for (field, column) in observed {
        schema.insert(field, column.unwrap_or(ColumnType::Text));
    }
    schema
}

fn header_schema() -> Schema {
    let mut schema = Schema::new();
    schema.insert("id".to_string(), ColumnType::PrimaryKey);
    schema.insert("created_at".to_string(), ColumnType::Timestamp);
    schema.insert("updated_at".to_string(), ColumnType::Timestamp);
    schema
}

fn column_type_of(value: &Value) -> ColumnType {
    match value {
        Value::Number(_) if value.is_integral() => ColumnType::Integer,
        Value::Number(_) => ColumnType::Decimal,
        Value::Bool(_) => ColumnType::Boolean,
        Value::String(_) | Value::Null => ColumnType::Text,
        Value::Array(_) | Value::Object(_) => ColumnType::Json,
    }
}

fn widen(a: ColumnType, b: ColumnType) -> ColumnType {
    use ColumnType::*;
    match (a, b) {
        _ if a == b => a,
        (Integer, Decimal) | (Decimal, Integer) => Decimal,
        _ => Json,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
