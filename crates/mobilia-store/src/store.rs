//! # Store
//!
//! The document store facade: table store, secondary indexes and front
//! cache behind one owner.
//!
//! ## Mutation Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create / update / delete / batch_*                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Stage the new table contents (nothing mutated yet)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. Persist the whole table blob  ──► error? return, state untouched   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. Commit to the table store                                          │
//! │  4. Re-index the affected records                                      │
//! │  5. Evict the table's front cache entry                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Path
//! ```text
//! query(table, filter)
//!      │
//!      ├── empty filter ──────────────► read_all (front cache first)
//!      │
//!      ├── first equality condition on an indexed field?
//!      │        yes → posting list → candidates in table order
//!      │        no  → every record
//!      │
//!      └── every condition re-checked on each candidate
//! ```
//!
//! ## Usage
//! ```rust
//! use mobilia_store::Store;
//! use mobilia_core::{fields_from_json, Filter};
//! use serde_json::json;
//!
//! let mut store = Store::in_memory();
//! store.create_index("products", "stock").unwrap();
//! store.create("products", fields_from_json(json!({ "name": "Chair", "price": 50, "stock": 3 }))).unwrap();
//! store.create("products", fields_from_json(json!({ "name": "Table", "price": 200, "stock": 0 }))).unwrap();
//!
//! assert_eq!(store.aggregate("products", "stock", "sum", &Filter::new()).unwrap(), 3.0);
//! let in_stock = store.query("products", &Filter::new().gt("stock", 0)).unwrap();
//! assert_eq!(in_stock.len(), 1);
//! ```

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::iter;
use std::sync::Arc;

use mobilia_core::validation::{validate_field_name, validate_record_id, validate_table_name};
use mobilia_core::{
    aggregate, infer_schema, infer_table_schema, paginate, AggregateOp, Fields, Filter, Page,
    Record, Schema, Value,
};
use tracing::{debug, info, warn};

use crate::backend::{table_key, Backend, MemoryBackend};
use crate::cache::{CacheStats, FrontCache, Snapshot};
use crate::codec;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::export::{MigrationBundle, MigrationExporter};
use crate::index::IndexManager;
use crate::table::Table;

/// The indexed document store.
///
/// One owner issues operations sequentially; share it across tasks with
/// [`crate::StoreHandle`].
#[derive(Debug)]
pub struct Store {
    namespace: String,
    backend: Box<dyn Backend>,
    tables: HashMap<String, Table>,
    indexes: IndexManager,
    cache: FrontCache,
}

impl Store {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens a store with the configured backend and builds configured indexes.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let backend = config.open_backend()?;
        Self::with_backend(config, backend)
    }

    /// Opens a store over an existing backend.
    pub fn with_backend(config: &StoreConfig, backend: Box<dyn Backend>) -> StoreResult<Self> {
        config.validate()?;

        info!(
            namespace = %config.storage.namespace,
            backend = %config.storage.backend,
            cache = config.cache.enabled,
            "Opening document store"
        );

        let mut store = Store {
            namespace: config.storage.namespace.clone(),
            backend,
            tables: HashMap::new(),
            indexes: IndexManager::new(),
            cache: FrontCache::new(config.cache.enabled),
        };

        for spec in &config.indexes {
            store.create_index(&spec.table, &spec.field)?;
        }

        Ok(store)
    }

    /// An empty in-memory store with default settings.
    pub fn in_memory() -> Self {
        Store {
            namespace: mobilia_core::DEFAULT_NAMESPACE.to_string(),
            backend: Box::new(MemoryBackend::new()),
            tables: HashMap::new(),
            indexes: IndexManager::new(),
            cache: FrontCache::new(true),
        }
    }

    /// Tears the store down: drops the cache and every loaded table.
    ///
    /// Every mutation is persisted before it returns, so nothing is
    /// pending here.
    pub fn close(mut self) {
        let tables = self.tables.len();
        self.cache.clear();
        self.tables.clear();
        info!(namespace = %self.namespace, tables, "Document store closed");
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // =========================================================================
    // Table Store: single-record operations
    // =========================================================================

    /// Creates a record.
    ///
    /// A caller-supplied `id` must be free in the table; otherwise a UUID
    /// is generated. `created_at` / `updated_at` in `fields` are ignored.
    pub fn create(&mut self, table: &str, fields: Fields) -> StoreResult<Record> {
        validate_table_name(table)?;
        let Store {
            namespace,
            backend,
            tables,
            indexes,
            cache,
        } = self;
        let records = load_table(tables, &**backend, namespace, table)?;

        let record = prepare_create(table, records, &HashSet::new(), fields)?;
        persist(
            &mut **backend,
            namespace,
            table,
            records.records().iter().chain(iter::once(&record)),
        )?;

        records.push(record.clone());
        indexes.on_record_upserted(table, &record, None);
        cache.invalidate(table);

        debug!(table, id = %record.id, "Record created");
        Ok(record)
    }

    /// Reads one record.
    pub fn read(&mut self, table: &str, id: &str) -> StoreResult<Record> {
        validate_table_name(table)?;
        let records = load_table(&mut self.tables, &*self.backend, &self.namespace, table)?;
        records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(table, id))
    }

    /// Reads the whole table in insertion order, through the front cache.
    pub fn read_all(&mut self, table: &str) -> StoreResult<Snapshot> {
        validate_table_name(table)?;
        if let Some(snapshot) = self.cache.get(table) {
            return Ok(snapshot);
        }

        let records = load_table(&mut self.tables, &*self.backend, &self.namespace, table)?;
        let snapshot: Snapshot = Arc::new(records.records().to_vec());
        self.cache.put(table, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Merges `partial` into an existing record.
    pub fn update(&mut self, table: &str, id: &str, partial: Fields) -> StoreResult<Record> {
        validate_table_name(table)?;
        let Store {
            namespace,
            backend,
            tables,
            indexes,
            cache,
        } = self;
        let records = load_table(tables, &**backend, namespace, table)?;

        let existing = records
            .get(id)
            .ok_or_else(|| StoreError::not_found(table, id))?;
        let updated = codec::merge(table, existing, partial);

        persist(
            &mut **backend,
            namespace,
            table,
            records
                .records()
                .iter()
                .map(|r| if r.id == updated.id { &updated } else { r }),
        )?;

        records.replace(updated.clone());
        indexes.on_record_upserted(table, &updated, None);
        cache.invalidate(table);

        debug!(table, id, "Record updated");
        Ok(updated)
    }

    /// Deletes a record. Returns `false` if the id was not there.
    pub fn delete(&mut self, table: &str, id: &str) -> StoreResult<bool> {
        validate_table_name(table)?;
        let Store {
            namespace,
            backend,
            tables,
            indexes,
            cache,
        } = self;
        let records = load_table(tables, &**backend, namespace, table)?;

        if !records.contains(id) {
            debug!(table, id, "Delete of absent record ignored");
            return Ok(false);
        }

        persist(
            &mut **backend,
            namespace,
            table,
            records.records().iter().filter(|r| r.id != id),
        )?;

        records.remove(id);
        indexes.on_record_deleted(table, id);
        cache.invalidate(table);

        debug!(table, id, "Record deleted");
        Ok(true)
    }

    /// Removes a table entirely: blob, records, indexes and cache entry.
    ///
    /// Returns `false` if nothing was stored or loaded under that name.
    pub fn drop_table(&mut self, table: &str) -> StoreResult<bool> {
        validate_table_name(table)?;
        let key = table_key(&self.namespace, table);
        let existed = self.backend.load(&key)?.is_some() || self.tables.contains_key(table);

        self.backend.remove(&key)?;
        self.tables.remove(table);
        self.indexes.drop_table(table);
        self.cache.invalidate(table);

        if existed {
            info!(table, "Table dropped");
        }
        Ok(existed)
    }

    // =========================================================================
    // Table Store: batches
    // =========================================================================

    /// Creates several records with one persisted write.
    ///
    /// ## Partial Failure
    /// Items are prepared in order. If one fails (e.g. a duplicate id),
    /// the items before it are still written and committed, then the
    /// error is returned. There is no rollback.
    pub fn batch_create(&mut self, table: &str, items: Vec<Fields>) -> StoreResult<Vec<Record>> {
        validate_table_name(table)?;
        let Store {
            namespace,
            backend,
            tables,
            indexes,
            cache,
        } = self;
        let records = load_table(tables, &**backend, namespace, table)?;

        let mut staged: Vec<Record> = Vec::with_capacity(items.len());
        let mut taken: HashSet<String> = HashSet::new();
        let mut failure = None;

        for fields in items {
            match prepare_create(table, records, &taken, fields) {
                Ok(record) => {
                    taken.insert(record.id.clone());
                    staged.push(record);
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if !staged.is_empty() {
            persist(
                &mut **backend,
                namespace,
                table,
                records.records().iter().chain(staged.iter()),
            )?;

            for record in &staged {
                records.push(record.clone());
                indexes.on_record_upserted(table, record, None);
            }
            cache.invalidate(table);
        }

        if let Some(err) = failure {
            warn!(table, committed = staged.len(), error = %err, "Batch create stopped early");
            return Err(err);
        }

        debug!(table, count = staged.len(), "Batch created");
        Ok(staged)
    }

    /// Updates several records with one persisted write.
    ///
    /// Ids not in the table are skipped. An id listed twice is updated
    /// twice, in order. Returns the updated records in input order.
    pub fn batch_update(
        &mut self,
        table: &str,
        updates: Vec<(String, Fields)>,
    ) -> StoreResult<Vec<Record>> {
        validate_table_name(table)?;
        let Store {
            namespace,
            backend,
            tables,
            indexes,
            cache,
        } = self;
        let records = load_table(tables, &**backend, namespace, table)?;

        let mut staged: HashMap<String, Record> = HashMap::new();
        let mut results = Vec::with_capacity(updates.len());

        for (id, partial) in updates {
            let Some(base) = staged.get(&id).or_else(|| records.get(&id)) else {
                debug!(table, id = %id, "Batch update skipped unknown id");
                continue;
            };
            let updated = codec::merge(table, base, partial);
            results.push(updated.clone());
            staged.insert(id, updated);
        }

        if staged.is_empty() {
            return Ok(results);
        }

        persist(
            &mut **backend,
            namespace,
            table,
            records
                .records()
                .iter()
                .map(|r| staged.get(&r.id).unwrap_or(r)),
        )?;

        for record in staged.into_values() {
            indexes.on_record_upserted(table, &record, None);
            records.replace(record);
        }
        cache.invalidate(table);

        debug!(table, count = results.len(), "Batch updated");
        Ok(results)
    }

    /// Deletes several records with one persisted write.
    ///
    /// Returns how many were actually removed; absent ids are skipped.
    pub fn batch_delete<S: AsRef<str>>(&mut self, table: &str, ids: &[S]) -> StoreResult<usize> {
        validate_table_name(table)?;
        let Store {
            namespace,
            backend,
            tables,
            indexes,
            cache,
        } = self;
        let records = load_table(tables, &**backend, namespace, table)?;

        let doomed: HashSet<&str> = ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| records.contains(id))
            .collect();

        if doomed.is_empty() {
            return Ok(0);
        }

        persist(
            &mut **backend,
            namespace,
            table,
            records
                .records()
                .iter()
                .filter(|r| !doomed.contains(r.id.as_str())),
        )?;

        for id in &doomed {
            records.remove(id);
            indexes.on_record_deleted(table, id);
        }
        cache.invalidate(table);

        debug!(table, count = doomed.len(), "Batch deleted");
        Ok(doomed.len())
    }

    // =========================================================================
    // Secondary Indexes
    // =========================================================================

    /// Builds an index on `field` from the table's current records.
    ///
    /// Idempotent: returns `false` if the index already existed.
    pub fn create_index(&mut self, table: &str, field: &str) -> StoreResult<bool> {
        validate_table_name(table)?;
        validate_field_name(field)?;
        let records = load_table(&mut self.tables, &*self.backend, &self.namespace, table)?;
        Ok(self.indexes.create_index(table, field, records.records()))
    }

    /// Indexed fields of a table.
    pub fn indexed_fields(&self, table: &str) -> Vec<String> {
        self.indexes.indexed_fields(table)
    }

    /// Ids currently holding `value` in the index on `field`.
    ///
    /// `None` if there is no such index.
    pub fn posting_list(&self, table: &str, field: &str, value: &Value) -> Option<Vec<String>> {
        self.indexes.posting_list(table, field, value)
    }

    /// Checks every index of `table` against the table's records.
    pub fn verify_indexes(&mut self, table: &str) -> StoreResult<bool> {
        validate_table_name(table)?;
        let records = load_table(&mut self.tables, &*self.backend, &self.namespace, table)?;
        Ok(self.indexes.is_consistent_with(table, records.records()))
    }

    // =========================================================================
    // Query Engine
    // =========================================================================

    /// Records matching every condition of `filter`, in table order.
    pub fn query(&mut self, table: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        if filter.is_empty() {
            return Ok(self.read_all(table)?.to_vec());
        }

        validate_table_name(table)?;
        let records = load_table(&mut self.tables, &*self.backend, &self.namespace, table)?;
        let indexes = &self.indexes;

        let narrowed = filter.iter().find_map(|(field, condition)| {
            let operand = condition.equality_operand()?;
            indexes
                .lookup(table, field, operand)
                .map(|ids| (field, ids))
        });

        let matches = match narrowed {
            Some((field, ids)) => {
                debug!(table, field, candidates = ids.len(), "Index-assisted query");
                filter.scan(records.select(ids))
            }
            None => {
                debug!(table, records = records.len(), "Full scan query");
                filter.scan(records.records())
            }
        };

        Ok(matches)
    }

    /// Number of records matching `filter`.
    pub fn count(&mut self, table: &str, filter: &Filter) -> StoreResult<usize> {
        Ok(self.query(table, filter)?.len())
    }

    // =========================================================================
    // Pagination & Aggregation
    // =========================================================================

    /// One 1-based page of `query(table, filter)`.
    pub fn paginate(
        &mut self,
        table: &str,
        page: usize,
        limit: usize,
        filter: &Filter,
    ) -> StoreResult<Page<Record>> {
        let matches = self.query(table, filter)?;
        Ok(paginate(matches, page, limit)?)
    }

    /// Aggregates `field` over `query(table, filter)` by operation name.
    ///
    /// An unknown operation name yields `0`.
    pub fn aggregate(
        &mut self,
        table: &str,
        field: &str,
        operation: &str,
        filter: &Filter,
    ) -> StoreResult<f64> {
        match operation.parse::<AggregateOp>() {
            Ok(op) => self.aggregate_with(table, field, op, filter),
            Err(err) => {
                warn!(table, field, error = %err, "Unknown aggregate operation, returning 0");
                Ok(0.0)
            }
        }
    }

    /// Aggregates `field` over `query(table, filter)`.
    pub fn aggregate_with(
        &mut self,
        table: &str,
        field: &str,
        op: AggregateOp,
        filter: &Filter,
    ) -> StoreResult<f64> {
        let matches = self.query(table, filter)?;
        Ok(aggregate(&matches, field, op))
    }

    // =========================================================================
    // Front Cache
    // =========================================================================

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// True if the table currently has a front cache entry.
    pub fn is_cached(&self, table: &str) -> bool {
        self.cache.contains(table)
    }

    // =========================================================================
    // Schema Inference / Migration Export
    // =========================================================================

    /// Schema of the table's first record, or `None` for an empty table.
    pub fn infer_schema(&mut self, table: &str) -> StoreResult<Option<Schema>> {
        validate_table_name(table)?;
        let records = load_table(&mut self.tables, &*self.backend, &self.namespace, table)?;
        Ok(records.records().first().map(infer_schema))
    }

    /// Schema reconciled across every record of the table.
    pub fn infer_table_schema(&mut self, table: &str) -> StoreResult<Schema> {
        validate_table_name(table)?;
        let records = load_table(&mut self.tables, &*self.backend, &self.namespace, table)?;
        Ok(infer_table_schema(records.records()))
    }

    /// Builds SQL DDL, data inserts and connection templates for `tables`.
    pub fn export_migration(&mut self, tables: &[&str]) -> StoreResult<MigrationBundle> {
        let mut exporter = MigrationExporter::new(&self.namespace);
        for &table in tables {
            let schema = self.infer_table_schema(table)?;
            let records = self.read_all(table)?;
            exporter.add_table(table, &schema, &records)?;
        }

        let bundle = exporter.finish()?;
        info!(tables = tables.len(), "Migration bundle exported");
        Ok(bundle)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Tables loaded into memory, sorted.
    pub fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Tables persisted under this store's namespace, sorted.
    pub fn stored_tables(&self) -> StoreResult<Vec<String>> {
        let prefix = format!("{}_", self.namespace);
        let mut names: Vec<String> = self
            .backend
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Returns the table, loading it from the backend on first access.
fn load_table<'t>(
    tables: &'t mut HashMap<String, Table>,
    backend: &dyn Backend,
    namespace: &str,
    table: &str,
) -> StoreResult<&'t mut Table> {
    match tables.entry(table.to_string()) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let key = table_key(namespace, table);
            let records = match backend.load(&key)? {
                Some(blob) => codec::decode_table(&blob)?,
                None => Vec::new(),
            };
            debug!(table, records = records.len(), "Table loaded");
            Ok(entry.insert(Table::from_records(table, records)))
        }
    }
}

/// Writes the staged contents of a table.
fn persist<'a, I>(
    backend: &mut dyn Backend,
    namespace: &str,
    table: &str,
    records: I,
) -> StoreResult<()>
where
    I: IntoIterator<Item = &'a Record>,
{
    let blob = codec::encode_table(records)?;
    backend.save(&table_key(namespace, table), &blob)
}

/// Builds a new record, checking the id against the table and `taken`.
fn prepare_create(
    table: &str,
    records: &Table,
    taken: &HashSet<String>,
    mut fields: Fields,
) -> StoreResult<Record> {
    let id = match codec::take_id(&mut fields) {
        Some(id) => {
            validate_record_id(&id)?;
            if records.contains(&id) || taken.contains(&id) {
                return Err(StoreError::duplicate(table, id));
            }
            id
        }
        None => loop {
            let id = codec::generate_id();
            if !records.contains(&id) && !taken.contains(&id) {
                break id;
            }
        },
    };

    codec::strip_reserved(table, &mut fields);
    Ok(codec::new_record(id, fields))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mobilia_core::{fields_from_json, Condition, Operator};
    use serde_json::json;

    fn fields(json: serde_json::Value) -> Fields {
        fields_from_json(json)
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    fn sorted(mut ids: Vec<String>) -> Vec<String> {
        ids.sort();
        ids
    }

    /// Backend whose writes can be switched off.
    #[derive(Debug, Default)]
    struct FlakyBackend {
        inner: MemoryBackend,
        fail_writes: bool,
    }

    impl Backend for FlakyBackend {
        fn load(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.load(key)
        }

        fn save(&mut self, key: &str, blob: &str) -> StoreResult<()> {
            if self.fail_writes {
                return Err(StoreError::Storage("disk full".to_string()));
            }
            self.inner.save(key, blob)
        }

        fn remove(&mut self, key: &str) -> StoreResult<()> {
            self.inner.remove(key)
        }

        fn keys(&self) -> StoreResult<Vec<String>> {
            self.inner.keys()
        }
    }

    /// Chair/Table fixture.
    fn furniture_store() -> (Store, String, String) {
        let mut store = Store::in_memory();
        let chair = store
            .create("products", fields(json!({ "name": "Chair", "price": 50, "stock": 3 })))
            .unwrap();
        let table = store
            .create("products", fields(json!({ "name": "Table", "price": 200, "stock": 0 })))
            .unwrap();
        (store, chair.id, table.id)
    }

    // -------------------------------------------------------------------------
    // Table store
    // -------------------------------------------------------------------------

    #[test]
    fn test_create_read_round_trip() {
        let mut store = Store::in_memory();
        let input = fields(json!({
            "name": "Oak Bench",
            "price": 120.5,
            "in_stock": true,
            "dimensions": { "w": 140, "d": 40 },
            "tags": ["oak", "hallway"]
        }));

        let created = store.create("products", input.clone()).unwrap();
        let read = store.read("products", &created.id).unwrap();

        assert_eq!(read.fields, input);
        assert_eq!(read.created_at, read.updated_at);
        assert!(!read.id.is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = Store::in_memory();
        store
            .create("products", fields(json!({ "id": "SOFA-1", "name": "Sofa" })))
            .unwrap();
        let err = store
            .create("products", fields(json!({ "id": "SOFA-1", "name": "Other" })))
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateId { .. }));
        let all = store.read_all("products").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("name"), Some(&Value::from("Sofa")));
    }

    #[test]
    fn test_reserved_fields_are_store_owned() {
        let mut store = Store::in_memory();
        let created = store
            .create(
                "products",
                fields(json!({ "name": "Lamp", "created_at": "1999-01-01T00:00:00Z" })),
            )
            .unwrap();
        assert!(created.get("created_at").is_none());
        assert!(created.created_at.timestamp() > 946_684_800);
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let mut store = Store::in_memory();
        assert!(matches!(
            store.read("products", "nope"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_merges_and_bumps_updated_at() {
        let (mut store, chair, _) = furniture_store();
        let before = store.read("products", &chair).unwrap();

        let first = store
            .update("products", &chair, fields(json!({ "stock": 2, "colour": "walnut" })))
            .unwrap();
        let second = store
            .update("products", &chair, fields(json!({ "stock": 1 })))
            .unwrap();

        assert_eq!(second.id, chair);
        assert_eq!(second.get("name"), Some(&Value::from("Chair")));
        assert_eq!(second.get("colour"), Some(&Value::from("walnut")));
        assert_eq!(second.get("stock"), Some(&Value::from(1)));
        assert!(first.updated_at > before.updated_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.created_at, before.created_at);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut store = Store::in_memory();
        assert!(matches!(
            store.update("products", "nope", Fields::new()),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (mut store, chair, table) = furniture_store();
        assert!(store.delete("products", &chair).unwrap());
        assert!(!store.delete("products", &chair).unwrap());
        assert!(!store.delete("products", "never-existed").unwrap());
        assert_eq!(ids(&store.read_all("products").unwrap()), vec![table]);
    }

    #[test]
    fn test_insertion_order_preserved_across_update() {
        let mut store = Store::in_memory();
        for name in ["a", "b", "c"] {
            store
                .create("products", fields(json!({ "id": name })))
                .unwrap();
        }
        store
            .update("products", "a", fields(json!({ "stock": 9 })))
            .unwrap();
        assert_eq!(ids(&store.read_all("products").unwrap()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_invalid_table_name_rejected() {
        let mut store = Store::in_memory();
        assert!(matches!(
            store.create("bad table", Fields::new()),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_drop_table() {
        let (mut store, _, _) = furniture_store();
        store.create_index("products", "name").unwrap();
        store.read_all("products").unwrap();

        assert!(store.drop_table("products").unwrap());
        assert!(!store.drop_table("products").unwrap());
        assert!(store.stored_tables().unwrap().is_empty());
        assert!(store.indexed_fields("products").is_empty());
        assert!(!store.is_cached("products"));
        assert!(store.read_all("products").unwrap().is_empty());
    }

    // -------------------------------------------------------------------------
    // Batches
    // -------------------------------------------------------------------------

    #[test]
    fn test_batch_create_single_write() {
        let mut store = Store::in_memory();
        store.create_index("products", "category").unwrap();

        let created = store
            .batch_create(
                "products",
                vec![
                    fields(json!({ "category": "chair" })),
                    fields(json!({ "category": "sofa" })),
                    fields(json!({ "category": "chair" })),
                ],
            )
            .unwrap();

        assert_eq!(created.len(), 3);
        let chairs = store
            .posting_list("products", "category", &Value::from("chair"))
            .unwrap();
        assert_eq!(chairs, sorted(vec![created[0].id.clone(), created[2].id.clone()]));
        assert!(store.verify_indexes("products").unwrap());
    }

    #[test]
    fn test_batch_create_keeps_items_before_failure() {
        let mut store = Store::in_memory();
        store
            .create("products", fields(json!({ "id": "taken" })))
            .unwrap();

        let err = store
            .batch_create(
                "products",
                vec![
                    fields(json!({ "id": "first" })),
                    fields(json!({ "id": "taken" })),
                    fields(json!({ "id": "never" })),
                ],
            )
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert_eq!(
            ids(&store.read_all("products").unwrap()),
            vec!["taken", "first"]
        );
    }

    #[test]
    fn test_batch_create_duplicate_within_batch() {
        let mut store = Store::in_memory();
        let result = store.batch_create(
            "products",
            vec![fields(json!({ "id": "x" })), fields(json!({ "id": "x" }))],
        );
        assert!(result.is_err());
        assert_eq!(store.read_all("products").unwrap().len(), 1);
    }

    #[test]
    fn test_batch_update_skips_unknown_ids() {
        let (mut store, chair, table) = furniture_store();
        store.create_index("products", "stock").unwrap();

        let updated = store
            .batch_update(
                "products",
                vec![
                    (chair.clone(), fields(json!({ "stock": 10 }))),
                    ("ghost".to_string(), fields(json!({ "stock": 99 }))),
                    (table.clone(), fields(json!({ "stock": 4 }))),
                    (chair.clone(), fields(json!({ "price": 45 }))),
                ],
            )
            .unwrap();

        assert_eq!(updated.len(), 3);
        let chair_now = store.read("products", &chair).unwrap();
        assert_eq!(chair_now.get("stock"), Some(&Value::from(10)));
        assert_eq!(chair_now.get("price"), Some(&Value::from(45)));
        assert!(store
            .posting_list("products", "stock", &Value::from(3))
            .unwrap()
            .is_empty());
        assert!(store.verify_indexes("products").unwrap());
        assert_eq!(store.read_all("products").unwrap().len(), 2);
    }

    #[test]
    fn test_batch_delete() {
        let (mut store, chair, table) = furniture_store();
        store.create_index("products", "name").unwrap();

        let removed = store
            .batch_delete("products", &[chair.as_str(), "ghost", chair.as_str()])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(ids(&store.read_all("products").unwrap()), vec![table]);
        assert!(store
            .posting_list("products", "name", &Value::from("Chair"))
            .unwrap()
            .is_empty());
        assert_eq!(store.batch_delete::<&str>("products", &[]).unwrap(), 0);
    }

    // -------------------------------------------------------------------------
    // Indexes and queries
    // -------------------------------------------------------------------------

    #[test]
    fn test_example_scenario() {
        let (mut store, chair, _) = furniture_store();
        store.create_index("products", "stock").unwrap();

        let empty = Filter::new();
        assert_eq!(store.aggregate("products", "stock", "sum", &empty).unwrap(), 3.0);

        let in_stock = Filter::new().with("stock", Condition::compare(Operator::Gt, 0));
        assert_eq!(ids(&store.query("products", &in_stock).unwrap()), vec![chair.clone()]);

        store.delete("products", &chair).unwrap();
        assert!(store.query("products", &in_stock).unwrap().is_empty());
        assert!(store
            .posting_list("products", "stock", &Value::from(3))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_create_index_is_idempotent_and_eager() {
        let (mut store, chair, _) = furniture_store();
        assert!(store.create_index("products", "stock").unwrap());
        assert!(!store.create_index("products", "stock").unwrap());
        assert_eq!(
            store.posting_list("products", "stock", &Value::from(3)),
            Some(vec![chair])
        );
        assert_eq!(store.indexed_fields("products"), vec!["stock"]);
    }

    #[test]
    fn test_update_moves_id_between_posting_lists() {
        let (mut store, chair, table) = furniture_store();
        store.create_index("products", "stock").unwrap();

        store
            .update("products", &chair, fields(json!({ "stock": 0 })))
            .unwrap();

        assert!(store
            .posting_list("products", "stock", &Value::from(3))
            .unwrap()
            .is_empty());
        assert_eq!(
            store.posting_list("products", "stock", &Value::from(0)).unwrap(),
            sorted(vec![chair.clone(), table])
        );

        // The stale value must not match through the index
        let old = store
            .query("products", &Filter::new().eq("stock", 3))
            .unwrap();
        assert!(old.is_empty());
    }

    #[test]
    fn test_index_narrows_then_rechecks_all_conditions() {
        let mut store = Store::in_memory();
        store.create_index("products", "category").unwrap();
        store
            .batch_create(
                "products",
                vec![
                    fields(json!({ "id": "c1", "category": "chair", "stock": 0, "name": "Oak Chair" })),
                    fields(json!({ "id": "c2", "category": "chair", "stock": 5, "name": "Ash Chair" })),
                    fields(json!({ "id": "s1", "category": "sofa", "stock": 5, "name": "Oak Sofa" })),
                ],
            )
            .unwrap();

        let filter = Filter::new()
            .gt("stock", 0)
            .eq("category", "chair")
            .like("name", "ash");
        assert_eq!(ids(&store.query("products", &filter).unwrap()), vec!["c2"]);

        let none = Filter::new().eq("category", "bed");
        assert!(store.query("products", &none).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_operator_degrades_to_equality() {
        let (mut store, _, table) = furniture_store();
        let filter: Filter =
            serde_json::from_value(json!({ "price": { "operator": "between", "operand": 200 } }))
                .unwrap();
        assert_eq!(ids(&store.query("products", &filter).unwrap()), vec![table]);
    }

    #[test]
    fn test_in_operator_through_store() {
        let (mut store, chair, table) = furniture_store();
        let filter = Filter::new().is_in("name", vec![Value::from("Chair"), Value::from("Table")]);
        assert_eq!(ids(&store.query("products", &filter).unwrap()), vec![chair, table]);
    }

    /// Applies the same deterministic operation sequence to an indexed
    /// store and a plain one, checking index consistency and that both
    /// answer every query identically.
    #[test]
    fn test_indexed_and_full_scan_paths_agree() {
        let mut indexed = Store::in_memory();
        indexed.create_index("products", "category").unwrap();
        indexed.create_index("products", "stock").unwrap();
        let mut plain = Store::in_memory();

        let categories = ["chair", "sofa", "table", "bed"];
        let mut seed: u64 = 0x5eed;
        let mut next = move |bound: u64| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) % bound
        };

        for step in 0..300u64 {
            let id = format!("p{}", next(40));
            let category = categories[next(4) as usize];
            let stock = next(5) as i64;
            match next(3) {
                0 => {
                    let input = fields(json!({ "id": id, "category": category, "stock": stock }));
                    let a = indexed.create("products", input.clone()).is_ok();
                    let b = plain.create("products", input).is_ok();
                    assert_eq!(a, b);
                }
                1 => {
                    let partial = if step % 2 == 0 {
                        fields(json!({ "stock": stock }))
                    } else {
                        fields(json!({ "category": category }))
                    };
                    let a = indexed.update("products", &id, partial.clone()).is_ok();
                    let b = plain.update("products", &id, partial).is_ok();
                    assert_eq!(a, b);
                }
                _ => {
                    assert_eq!(
                        indexed.delete("products", &id).unwrap(),
                        plain.delete("products", &id).unwrap()
                    );
                }
            }
            assert!(indexed.verify_indexes("products").unwrap());
        }

        let mut filters = vec![Filter::new()];
        for category in categories {
            for stock in 0..5 {
                filters.push(Filter::new().eq("category", category).eq("stock", stock));
                filters.push(Filter::new().eq("category", category).gt("stock", stock));
                filters.push(Filter::new().lte("stock", stock).eq("category", category));
                filters.push(Filter::new().ne("category", category).eq("stock", stock));
                filters.push(Filter::new().eq("category", category).ne("stock", stock));
                filters.push(
                    Filter::new()
                        .is_in("category", vec![Value::from(category), Value::from("bed")])
                        .eq("stock", stock),
                );
                filters.push(
                    Filter::new()
                        .eq("category", category)
                        .is_in("stock", vec![Value::from(stock), Value::from(stock + 1)]),
                );
                filters.push(Filter::new().like("category", &category[..2]).eq("stock", stock));
                filters.push(Filter::new().eq("category", category).like("stock", stock));
            }
            filters.push(Filter::new().with("category", Condition::Equals(Value::from(category))));
            filters.push(Filter::new().ne("category", category));
            filters.push(Filter::new().like("category", category.to_uppercase()));
        }

        for filter in &filters {
            assert_eq!(
                ids(&indexed.query("products", filter).unwrap()),
                ids(&plain.query("products", filter).unwrap()),
                "filter {:?}",
                filter
            );
        }
    }

    // -------------------------------------------------------------------------
    // Pagination and aggregation
    // -------------------------------------------------------------------------

    #[test]
    fn test_pages_reconstruct_query() {
        let mut store = Store::in_memory();
        let items = (0..23)
            .map(|i| fields(json!({ "n": i, "even": i % 2 == 0 })))
            .collect();
        store.batch_create("products", items).unwrap();

        let filter = Filter::new().eq("even", true);
        let expected = store.query("products", &filter).unwrap();
        let first = store.paginate("products", 1, 5, &filter).unwrap();
        assert_eq!(first.pagination.total, 12);
        assert_eq!(first.pagination.pages, 3);

        let mut rebuilt = Vec::new();
        for page in 1..=first.pagination.pages {
            rebuilt.extend(store.paginate("products", page, 5, &filter).unwrap().data);
        }
        assert_eq!(ids(&rebuilt), ids(&expected));

        assert!(store.paginate("products", 0, 5, &filter).is_err());
    }

    #[test]
    fn test_aggregations() {
        let (mut store, _, _) = furniture_store();
        store
            .create("products", fields(json!({ "name": "Rug", "price": "ask" })))
            .unwrap();
        let all = Filter::new();

        assert_eq!(store.aggregate("products", "price", "sum", &all).unwrap(), 250.0);
        assert_eq!(store.aggregate("products", "price", "avg", &all).unwrap(), 125.0);
        assert_eq!(store.aggregate("products", "price", "min", &all).unwrap(), 50.0);
        assert_eq!(store.aggregate("products", "price", "max", &all).unwrap(), 200.0);
        assert_eq!(store.aggregate("products", "price", "count", &all).unwrap(), 3.0);
        assert_eq!(store.aggregate("products", "price", "median", &all).unwrap(), 0.0);

        let cheap = Filter::new().lt("price", 100);
        assert_eq!(
            store
                .aggregate_with("products", "price", AggregateOp::Count, &cheap)
                .unwrap(),
            1.0
        );
        assert_eq!(store.count("products", &cheap).unwrap(), 1);
    }

    // -------------------------------------------------------------------------
    // Front cache
    // -------------------------------------------------------------------------

    #[test]
    fn test_cache_never_stale_after_mutation() {
        let (mut store, chair, _) = furniture_store();

        let first = store.read_all("products").unwrap();
        let again = store.read_all("products").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert!(store.is_cached("products"));

        store
            .update("products", &chair, fields(json!({ "stock": 7 })))
            .unwrap();
        assert!(!store.is_cached("products"));

        let fresh = store.read_all("products").unwrap();
        assert_eq!(fresh[0].get("stock"), Some(&Value::from(7)));

        store.delete("products", &chair).unwrap();
        assert_eq!(store.read_all("products").unwrap().len(), 1);

        let stats = store.cache_stats();
        assert!(stats.hits >= 1);
        assert!(stats.evictions >= 2);
    }

    #[test]
    fn test_cache_disabled() {
        let config = StoreConfig::in_memory().cache_enabled(false);
        let mut store = Store::open(&config).unwrap();
        store.create("products", Fields::new()).unwrap();
        store.read_all("products").unwrap();
        assert!(!store.is_cached("products"));
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    #[test]
    fn test_reopen_loads_lazily_from_backend() {
        let backend = MemoryBackend::new();
        let config = StoreConfig::in_memory().namespace("shop");

        let mut first = Store::with_backend(&config, Box::new(backend.clone())).unwrap();
        let chair = first
            .create("products", fields(json!({ "name": "Chair" })))
            .unwrap();
        first.create("orders", fields(json!({ "total": 50 }))).unwrap();
        first.close();

        assert!(backend.load("shop_products").unwrap().is_some());

        let config = config.index("products", "name");
        let mut second = Store::with_backend(&config, Box::new(backend)).unwrap();
        assert_eq!(second.tables(), vec!["products"]);
        assert_eq!(second.stored_tables().unwrap(), vec!["orders", "products"]);

        assert_eq!(second.read("products", &chair.id).unwrap(), chair);
        assert_eq!(
            second.posting_list("products", "name", &Value::from("Chair")),
            Some(vec![chair.id])
        );
    }

    #[test]
    fn test_namespaces_sharing_a_backend_stay_apart() {
        let backend = MemoryBackend::new();
        let mut shop = Store::with_backend(
            &StoreConfig::in_memory().namespace("shop"),
            Box::new(backend.clone()),
        )
        .unwrap();
        let mut shop_eu = Store::with_backend(
            &StoreConfig::in_memory().namespace("shop-eu"),
            Box::new(backend.clone()),
        )
        .unwrap();

        shop.create("orders", fields(json!({ "total": 10 }))).unwrap();
        shop_eu
            .create("products", fields(json!({ "name": "Stool" })))
            .unwrap();

        assert_eq!(shop.stored_tables().unwrap(), vec!["orders"]);
        assert_eq!(shop_eu.stored_tables().unwrap(), vec!["products"]);
        assert!(shop.read_all("products").unwrap().is_empty());

        let clashing = Store::with_backend(
            &StoreConfig::in_memory().namespace("shop_eu"),
            Box::new(backend),
        );
        assert!(matches!(clashing, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_failed_write_leaves_state_untouched() {
        let mut store = Store::with_backend(
            &StoreConfig::in_memory(),
            Box::new(FlakyBackend::default()),
        )
        .unwrap();
        store.create_index("products", "stock").unwrap();
        let chair = store
            .create("products", fields(json!({ "stock": 3 })))
            .unwrap();
        store.read_all("products").unwrap();

        store.backend = Box::new(FlakyBackend {
            inner: MemoryBackend::new(),
            fail_writes: true,
        });

        assert!(matches!(
            store.update("products", &chair.id, fields(json!({ "stock": 0 }))),
            Err(StoreError::Storage(_))
        ));
        assert!(store.delete("products", &chair.id).is_err());
        assert!(store.create("products", Fields::new()).is_err());

        assert_eq!(store.read("products", &chair.id).unwrap(), chair);
        assert!(store.is_cached("products"));
        assert_eq!(
            store.posting_list("products", "stock", &Value::from(3)),
            Some(vec![chair.id.clone()])
        );
        assert!(store.verify_indexes("products").unwrap());
    }

    // -------------------------------------------------------------------------
    // Schema
    // -------------------------------------------------------------------------

    #[test]
    fn test_schema_inference() {
        let (mut store, _, _) = furniture_store();
        store
            .create("products", fields(json!({ "name": "Desk", "price": 149.99, "legs": 4 })))
            .unwrap();

        let sample = store.infer_schema("products").unwrap().unwrap();
        assert!(!sample.contains_key("legs"));

        let full = store.infer_table_schema("products").unwrap();
        assert_eq!(full["legs"], mobilia_core::ColumnType::Integer);
        assert_eq!(full["price"], mobilia_core::ColumnType::Decimal);

        assert!(store.infer_schema("orders").unwrap().is_none());
    }

    #[test]
    fn test_export_migration() {
        let (mut store, _, _) = furniture_store();
        store
            .create("orders", fields(json!({ "total": 250, "paid": true })))
            .unwrap();

        let bundle = store.export_migration(&["products", "orders"]).unwrap();
        assert!(bundle.schema_sql.contains("CREATE TABLE IF NOT EXISTS \"products\""));
        assert!(bundle.schema_sql.contains("\"paid\" BOOLEAN"));
        assert_eq!(bundle.data_sql.matches("INSERT INTO").count(), 3);
        assert!(bundle.env_template.contains("DB_NAME=mobilia"));
    }
}
