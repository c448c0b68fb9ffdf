//! # Table Store
//!
//! The per-table ordered record collection: the single source of truth.
//!
//! ```text
//! records:   [ chair-1 , table-7 , sofa-2 ]   insertion order
//! positions: { chair-1: 0, table-7: 1, sofa-2: 2 }
//! ```
//!
//! `positions` lets the query engine turn a posting list back into
//! records in table order without scanning.

use std::collections::HashMap;

use mobilia_core::Record;
use tracing::warn;

/// One table's records.
#[derive(Debug, Clone, Default)]
pub struct Table {
    records: Vec<Record>,
    positions: HashMap<String, usize>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from decoded records.
    ///
    /// A blob edited by hand could repeat an id; the first occurrence wins.
    pub fn from_records(name: &str, records: Vec<Record>) -> Self {
        let mut table = Table::new();
        for record in records {
            if table.contains(&record.id) {
                warn!(table = name, id = %record.id, "Dropping duplicate id from persisted blob");
                continue;
            }
            table.push(record);
        }
        table
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.positions.get(id).map(|&pos| &self.records[pos])
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Appends a record. The caller has checked the id is free.
    pub fn push(&mut self, record: Record) {
        self.positions.insert(record.id.clone(), self.records.len());
        self.records.push(record);
    }

    /// Replaces the record with the same id in place, returning the old one.
    pub fn replace(&mut self, record: Record) -> Option<Record> {
        let pos = *self.positions.get(&record.id)?;
        Some(std::mem::replace(&mut self.records[pos], record))
    }

    /// Removes a record, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<Record> {
        let pos = self.positions.remove(id)?;
        let removed = self.records.remove(pos);
        for (offset, record) in self.records[pos..].iter().enumerate() {
            self.positions.insert(record.id.clone(), pos + offset);
        }
        Some(removed)
    }

    /// Records with the given ids, in table order. Unknown ids are skipped.
    pub fn select<'a, I>(&self, ids: I) -> Vec<&Record>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut positions: Vec<usize> = ids
            .into_iter()
            .filter_map(|id| self.positions.get(id).copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions.into_iter().map(|pos| &self.records[pos]).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
