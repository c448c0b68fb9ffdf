//! # mobilia-store: Embedded Document Store for Mobilia POS
//!
//! Named tables of schemaless records, persisted as one blob per table,
//! with secondary indexes, filtered queries, pagination, aggregation and
//! a front cache.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Mobilia POS Data Flow                             │
//! │                                                                         │
//! │  Feature services (products, orders, raw materials, users)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  mobilia-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐    │   │
//! │  │   │   Store     │──►│ Table Store  │◄──│ Index Manager    │    │   │
//! │  │   │ (store.rs)  │   │ (table.rs)   │   │ (index.rs)       │    │   │
//! │  │   │             │   └──────────────┘   └──────────────────┘    │   │
//! │  │   │ query       │   ┌──────────────┐   ┌──────────────────┐    │   │
//! │  │   │ paginate    │──►│ Front Cache  │   │ Export (SQL)     │    │   │
//! │  │   │ aggregate   │   │ (cache.rs)   │   │ (export.rs)      │    │   │
//! │  │   └─────────────┘   └──────────────┘   └──────────────────┘    │   │
//! │  │          │                                                      │   │
//! │  └──────────┼──────────────────────────────────────────────────────┘   │
//! │             ▼                                                           │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Backend: <namespace>_<table>  →  JSON array of records         │   │
//! │  │  FileBackend (data_dir/*.json) | MemoryBackend (tests)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The store facade: CRUD, batches, queries, aggregation
//! - [`shared`] - Async handle for sharing one store across tasks
//! - [`table`] - Ordered per-table record collection
//! - [`index`] - Secondary (inverted) indexes
//! - [`cache`] - Front cache of materialized tables
//! - [`codec`] - Record creation, merge, and blob encoding
//! - [`backend`] - Persistence backends
//! - [`config`] - Store configuration
//! - [`export`] - PostgreSQL migration export
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mobilia_store::{Store, StoreConfig};
//! use mobilia_core::{fields_from_json, Filter};
//!
//! let config = StoreConfig::load(None)?.index("products", "category");
//! let mut store = Store::open(&config)?;
//!
//! store.create("products", fields_from_json(json!({ "name": "Oak Chair", "category": "chair" })))?;
//! let chairs = store.paginate("products", 1, 20, &Filter::new().eq("category", "chair"))?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod index;
pub mod shared;
pub mod store;
pub mod table;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{Backend, FileBackend, MemoryBackend};
pub use cache::{CacheStats, Snapshot};
pub use config::{BackendKind, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use export::MigrationBundle;
pub use shared::StoreHandle;
pub use store::Store;
