//! # Validation Module
//!
//! Input shape validation for the document store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Feature code (product / order / raw-material screens)        │
//! │  └── Business rules (price > 0, stock limits, ...)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Table and field names usable as storage keys                      │
//! │  ├── Record ids non-empty and bounded                                  │
//! │  └── Page / limit are 1-based                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store                                                        │
//! │  └── Id uniqueness (DuplicateId)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mobilia_core::validation::{validate_table_name, validate_limit};
//!
//! validate_table_name("raw_materials").unwrap();
//! validate_limit(20).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_ID_LENGTH, MAX_NAME_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Name Validators
// =============================================================================

/// Validates a table name.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Only ASCII letters, digits, underscores and hyphens (the name becomes
///   part of the persisted key and of exported SQL identifiers)
///
/// ## Example
/// ```rust
/// use mobilia_core::validation::validate_table_name;
///
/// assert!(validate_table_name("products").is_ok());
/// assert!(validate_table_name("").is_err());
/// assert!(validate_table_name("order items").is_err());
/// ```
pub fn validate_table_name(table: &str) -> ValidationResult<()> {
    validate_identifier("table", table)
}

/// Validates an indexed or aggregated field name.
///
/// Same rules as [`validate_table_name`].
pub fn validate_field_name(field: &str) -> ValidationResult<()> {
    validate_identifier("field", field)
}

fn validate_identifier(label: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: label.to_string(),
        });
    }

    if value.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: label.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: label.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a storage namespace.
///
/// Keys are `<namespace>_<table>`, so a namespace may not contain `_`
/// (two namespaces would share keys) nor path characters (the file
/// backend turns keys into file names).
pub fn validate_namespace(namespace: &str) -> ValidationResult<()> {
    validate_identifier("namespace", namespace)?;

    if namespace.contains('_') {
        return Err(ValidationError::InvalidFormat {
            field: "namespace".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a caller-supplied record id.
///
/// Ids are opaque: any non-blank string up to 128 characters is accepted.
pub fn validate_record_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: MAX_ID_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Pagination Validators
// =============================================================================

/// Validates a 1-based page number.
pub fn validate_page(page: usize) -> ValidationResult<()> {
    if page == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }
    Ok(())
}

/// Validates a page size.
pub fn validate_limit(limit: usize) -> ValidationResult<()> {
    if limit == 0 {
        return Err(ValidationError::MustBePositive {
            field: "limit".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
