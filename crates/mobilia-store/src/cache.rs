//! # Front Cache
//!
//! Table name → last materialized record sequence.
//!
//! ```text
//! read_all("products")
//!      │
//!      ├── cache hit  → Arc clone, no copy
//!      │
//!      └── cache miss → materialize from the table store → put → return
//!
//! any mutation of "products" → invalidate("products") before returning
//! ```
//!
//! The cache holds derived data only. An entry is either absent or equal
//! to the table store's current contents.

use std::collections::HashMap;
use std::sync::Arc;

use mobilia_core::Record;
use serde::Serialize;
use tracing::debug;

/// Shared, immutable view of a table's records.
pub type Snapshot = Arc<Vec<Record>>;

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug)]
pub struct FrontCache {
    enabled: bool,
    entries: HashMap<String, Snapshot>,
    stats: CacheStats,
}

impl FrontCache {
    pub fn new(enabled: bool) -> Self {
        FrontCache {
            enabled,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&mut self, table: &str) -> Option<Snapshot> {
        if !self.enabled {
            return None;
        }
        match self.entries.get(table) {
            Some(snapshot) => {
                self.stats.hits += 1;
                debug!(table, "Front cache hit");
                Some(Arc::clone(snapshot))
            }
            None => {
                self.stats.misses += 1;
                debug!(table, "Front cache miss");
                None
            }
        }
    }

    pub fn put(&mut self, table: &str, snapshot: Snapshot) {
        if self.enabled {
            self.entries.insert(table.to_string(), snapshot);
        }
    }

    /// Evicts a table's entry.
    pub fn invalidate(&mut self, table: &str) {
        if self.entries.remove(table).is_some() {
            self.stats.evictions += 1;
            debug!(table, "Front cache entry evicted");
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        self.entries.contains_key(table)
    }

    /// Drops every entry (teardown).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
