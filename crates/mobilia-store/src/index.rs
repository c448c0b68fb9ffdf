//! # Secondary Index Manager
//!
//! One inverted index per (table, field), kept an exact projection of the
//! table on every mutation.
//!
//! ## Index Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  (products, category)                                                   │
//! │                                                                         │
//! │  postings                          keys_by_id                           │
//! │  ───────────────────────────       ─────────────────────                │
//! │  "s:chair" → { c1, c4 }            c1 → "s:chair"                       │
//! │  "s:sofa"  → { s2 }                c4 → "s:chair"                       │
//! │  "z:"      → { x9 }   (missing)    s2 → "s:sofa"                        │
//! │                                    x9 → "z:"                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariant
//! Every record id appears in exactly one posting list per indexed field:
//! the one keyed by its current value. `keys_by_id` remembers that key so
//! a changed value moves the id instead of leaving a stale posting, and
//! empty posting lists are removed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use mobilia_core::{Record, Value};
use tracing::{debug, info};

/// Inverted index for one field.
#[derive(Debug, Clone, Default)]
struct FieldIndex {
    postings: BTreeMap<String, BTreeSet<String>>,
    keys_by_id: HashMap<String, String>,
}

impl FieldIndex {
    fn build(field: &str, records: &[Record]) -> Self {
        let mut index = FieldIndex::default();
        for record in records {
            index.upsert(&record.id, record.value(field).index_key());
        }
        index
    }

    /// Moves `id` to the posting list for `key`.
    fn upsert(&mut self, id: &str, key: String) {
        if self.keys_by_id.get(id) == Some(&key) {
            return;
        }
        self.remove(id);
        self.postings
            .entry(key.clone())
            .or_default()
            .insert(id.to_string());
        self.keys_by_id.insert(id.to_string(), key);
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(old_key) = self.keys_by_id.remove(id) else {
            return false;
        };
        if let Some(ids) = self.postings.get_mut(&old_key) {
            ids.remove(id);
            if ids.is_empty() {
                self.postings.remove(&old_key);
            }
        }
        true
    }
}

/// All secondary indexes of a store.
#[derive(Debug, Default)]
pub struct IndexManager {
    tables: HashMap<String, BTreeMap<String, FieldIndex>>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index over `records` unless one already exists.
    ///
    /// Returns `true` if a new index was built.
    pub fn create_index(&mut self, table: &str, field: &str, records: &[Record]) -> bool {
        let fields = self.tables.entry(table.to_string()).or_default();
        if fields.contains_key(field) {
            debug!(table, field, "Index already exists");
            return false;
        }

        let index = FieldIndex::build(field, records);
        info!(
            table,
            field,
            records = records.len(),
            keys = index.postings.len(),
            "Secondary index built"
        );
        fields.insert(field.to_string(), index);
        true
    }

    pub fn has_index(&self, table: &str, field: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|fields| fields.contains_key(field))
    }

    /// Indexed fields of a table, sorted.
    pub fn indexed_fields(&self, table: &str) -> Vec<String> {
        self.tables
            .get(table)
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Re-indexes a created or updated record.
    ///
    /// With `field = None` every index of the table is refreshed. A field
    /// with no index is ignored. An id whose value changed is moved out of
    /// its old posting list before joining the new one.
    pub fn on_record_upserted(&mut self, table: &str, record: &Record, field: Option<&str>) {
        let Some(fields) = self.tables.get_mut(table) else {
            return;
        };
        match field {
            Some(name) => {
                if let Some(index) = fields.get_mut(name) {
                    index.upsert(&record.id, record.value(name).index_key());
                }
            }
            None => {
                for (name, index) in fields.iter_mut() {
                    index.upsert(&record.id, record.value(name).index_key());
                }
            }
        }
    }

    /// Removes `id` from every index of the table.
    pub fn on_record_deleted(&mut self, table: &str, id: &str) {
        let Some(fields) = self.tables.get_mut(table) else {
            return;
        };
        for index in fields.values_mut() {
            index.remove(id);
        }
    }

    /// Drops every index of a table.
    pub fn drop_table(&mut self, table: &str) {
        if self.tables.remove(table).is_some() {
            debug!(table, "Indexes dropped");
        }
    }

    /// Ids holding `value` for `field`, or `None` if the field has no index.
    pub fn lookup(&self, table: &str, field: &str, value: &Value) -> Option<Vec<&str>> {
        let index = self.tables.get(table)?.get(field)?;
        Some(
            index
                .postings
                .get(&value.index_key())
                .map(|ids| ids.iter().map(String::as_str).collect())
                .unwrap_or_default(),
        )
    }

    /// Owned, sorted copy of a posting list. `None` if the field has no index.
    pub fn posting_list(&self, table: &str, field: &str, value: &Value) -> Option<Vec<String>> {
        self.lookup(table, field, value)
            .map(|ids| ids.into_iter().map(str::to_string).collect())
    }

    /// Number of distinct values in an index.
    pub fn distinct_values(&self, table: &str, field: &str) -> Option<usize> {
        Some(self.tables.get(table)?.get(field)?.postings.len())
    }

    /// Checks every index of `table` against the authoritative records.
    ///
    /// True iff each posting list holds exactly the ids of records whose
    /// current value maps to its key, and nothing else.
    pub fn is_consistent_with(&self, table: &str, records: &[Record]) -> bool {
        let Some(fields) = self.tables.get(table) else {
            return true;
        };
        fields.iter().all(|(field, index)| {
            let expected = FieldIndex::build(field, records);
            expected.postings == index.postings && expected.keys_by_id == index.keys_by_id
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
