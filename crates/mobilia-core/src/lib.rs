//! # mobilia-core: Pure Data Model for the Mobilia Store
//!
//! This crate holds everything about records that does not touch storage:
//! the value type, the record header, filter evaluation, pagination,
//! aggregation and schema inference.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Mobilia POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          POS screens / storefront (external collaborators)      │   │
//! │  │    Products ──► Orders ──► Raw materials ──► Users              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process API                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 mobilia-store (tables, indexes, cache)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ mobilia-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  value  │ │ record  │ │ filter  │ │  page   │ │ schema  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO PERSISTENCE • PURE FUNCTIONS                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`value`] - Tagged field values
//! - [`record`] - Record header + fields
//! - [`filter`] - Conditions and per-record evaluation
//! - [`page`] - 1-based pagination
//! - [`aggregate`] - sum / avg / min / max / count
//! - [`schema`] - Column type inference for SQL export
//! - [`validation`] - Input shape checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use mobilia_core::{fields_from_json, Filter, Record};
//! use chrono::Utc;
//! use serde_json::json;
//!
//! let now = Utc::now();
//! let chair = Record {
//!     id: "chair-1".to_string(),
//!     created_at: now,
//!     updated_at: now,
//!     fields: fields_from_json(json!({ "name": "Chair", "price": 50, "stock": 3 })),
//! };
//!
//! assert!(Filter::new().gt("stock", 0).matches(&chair));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod page;
pub mod record;
pub mod schema;
pub mod validation;
pub mod value;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregate::{aggregate, AggregateOp};
pub use error::{CoreError, CoreResult, ValidationError};
pub use filter::{Condition, Filter, Operator};
pub use page::{paginate, Page, Pagination};
pub use record::{fields_from_json, Fields, Record, RESERVED_FIELDS};
pub use schema::{infer_schema, infer_table_schema, ColumnType, Schema};
pub use value::Value;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default storage namespace; persisted keys look like `mobilia_products`.
pub const DEFAULT_NAMESPACE: &str = "mobilia";

/// Maximum length of table and field names.
pub const MAX_NAME_LENGTH: usize = 64;

/// Maximum length of a caller-supplied record id.
pub const MAX_ID_LENGTH: usize = 128;

/// Table names used by the POS features.
pub mod tables {
    pub const PRODUCTS: &str = "products";
    pub const ORDERS: &str = "orders";
    pub const RAW_MATERIALS: &str = "raw_materials";
    pub const USERS: &str = "users";
}
