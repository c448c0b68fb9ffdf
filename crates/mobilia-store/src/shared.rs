//! # Shared Store Handle
//!
//! A cloneable async handle around one [`Store`].
//!
//! ## Thread Safety
//! The store sits behind a single `tokio::sync::Mutex`:
//! 1. Feature services in different tasks share one store
//! 2. A mutation must not interleave with another mutation's persist/commit
//! 3. Holding the lock across a whole batch keeps it atomic for other tasks
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  task A: products service ──┐                                           │
//! │  task B: orders service  ───┼──► StoreHandle ──► Mutex<Store>           │
//! │  task C: report export   ───┘        (clone)        one at a time       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use mobilia_core::{AggregateOp, Fields, Filter, Page, Record, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{CacheStats, Snapshot};
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::export::MigrationBundle;
use crate::store::Store;

/// Cloneable handle; every clone talks to the same store.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    inner: Arc<Mutex<Store>>,
}

impl StoreHandle {
    pub fn new(store: Store) -> Self {
        StoreHandle {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Opens a store from config and wraps it.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        Ok(Self::new(Store::open(config)?))
    }

    /// Runs `f` with exclusive access to the store.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let moved = handle
    ///     .with_store(|store| {
    ///         let ids = store.query("orders", &Filter::new().eq("status", "draft"))?;
    ///         store.batch_update("orders", ids.into_iter().map(|r| (r.id, paid.clone())).collect())
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_store<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Store) -> R,
    {
        let mut store = self.inner.lock().await;
        f(&mut store)
    }

    pub async fn create(&self, table: &str, fields: Fields) -> StoreResult<Record> {
        self.inner.lock().await.create(table, fields)
    }

    pub async fn read(&self, table: &str, id: &str) -> StoreResult<Record> {
        self.inner.lock().await.read(table, id)
    }

    pub async fn read_all(&self, table: &str) -> StoreResult<Snapshot> {
        self.inner.lock().await.read_all(table)
    }

    pub async fn update(&self, table: &str, id: &str, partial: Fields) -> StoreResult<Record> {
        self.inner.lock().await.update(table, id, partial)
    }

    pub async fn delete(&self, table: &str, id: &str) -> StoreResult<bool> {
        self.inner.lock().await.delete(table, id)
    }

    pub async fn batch_create(&self, table: &str, items: Vec<Fields>) -> StoreResult<Vec<Record>> {
        self.inner.lock().await.batch_create(table, items)
    }

    pub async fn batch_update(
        &self,
        table: &str,
        updates: Vec<(String, Fields)>,
    ) -> StoreResult<Vec<Record>> {
        self.inner.lock().await.batch_update(table, updates)
    }

    pub async fn batch_delete(&self, table: &str, ids: &[String]) -> StoreResult<usize> {
        self.inner.lock().await.batch_delete(table, ids)
    }

    pub async fn create_index(&self, table: &str, field: &str) -> StoreResult<bool> {
        self.inner.lock().await.create_index(table, field)
    }

    pub async fn posting_list(&self, table: &str, field: &str, value: &Value) -> Option<Vec<String>> {
        self.inner.lock().await.posting_list(table, field, value)
    }

    pub async fn query(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        self.inner.lock().await.query(table, filter)
    }

    pub async fn count(&self, table: &str, filter: &Filter) -> StoreResult<usize> {
        self.inner.lock().await.count(table, filter)
    }

    pub async fn paginate(
        &self,
        table: &str,
        page: usize,
        limit: usize,
        filter: &Filter,
    ) -> StoreResult<Page<Record>> {
        self.inner.lock().await.paginate(table, page, limit, filter)
    }

    pub async fn aggregate(
        &self,
        table: &str,
        field: &str,
        operation: &str,
        filter: &Filter,
    ) -> StoreResult<f64> {
        self.inner
            .lock()
            .await
            .aggregate(table, field, operation, filter)
    }

    pub async fn aggregate_with(
        &self,
        table: &str,
        field: &str,
        op: AggregateOp,
        filter: &Filter,
    ) -> StoreResult<f64> {
        self.inner
            .lock()
            .await
            .aggregate_with(table, field, op, filter)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.inner.lock().await.cache_stats()
    }

    pub async fn export_migration(&self, tables: &[&str]) -> StoreResult<MigrationBundle> {
        self.inner.lock().await.export_migration(tables)
    }

    /// Closes the store if this is the last handle.
    ///
    /// Returns `false` while other clones are still alive; the store then
    /// stays open for them.
    pub fn close(self) -> bool {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => {
                mutex.into_inner().close();
                true
            }
            Err(_) => {
                debug!("Store still shared, close deferred to the last handle");
                false
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
