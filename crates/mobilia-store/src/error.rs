//! # Store Error Types
//!
//! Error types for store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  io::Error / serde_json::Error (backend, codec)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds table / id context                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Feature code (products, orders, raw materials, users)                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures surface once, immediately. There is no retry policy.

use mobilia_core::{CoreError, ValidationError};
use thiserror::Error;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found.
    ///
    /// ## When This Occurs
    /// - `read` or `update` of an id the table does not hold
    /// - never from `delete`, which treats a missing id as a no-op
    #[error("{table} record not found: {id}")]
    NotFound { table: String, id: String },

    /// Create with an id the table already holds.
    #[error("Duplicate id in {table}: '{id}' already exists")]
    DuplicateId { table: String, id: String },

    /// Backend rejected a load or save.
    #[error("Storage failed: {0}")]
    Storage(String),

    /// File backend I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Table blob could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Invalid store configuration.
    #[error("Invalid store configuration: {0}")]
    Config(String),

    /// Input shape check failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Core data-model error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    /// Creates a NotFound error for a table and id.
    pub fn not_found(table: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            table: table.into(),
            id: id.into(),
        }
    }

    /// Creates a DuplicateId error.
    pub fn duplicate(table: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::DuplicateId {
            table: table.into(),
            id: id.into(),
        }
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
