//! # Pagination
//!
//! Slices an ordered result set into 1-based pages.
//!
//! ```text
//! total = 45, limit = 20
//!
//!   page 1 → [ 0, 20)
//!   page 2 → [20, 40)
//!   page 3 → [40, 45)
//!   page 4 → []          (out of range: empty, not an error)
//!
//!   pages = ceil(45 / 20) = 3
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::validation::{validate_limit, validate_page, ValidationResult};

/// Page metadata returned alongside the page's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    /// 1-based page number that was requested.
    pub page: usize,
    /// Page size.
    pub limit: usize,
    /// Number of matches before slicing.
    pub total: usize,
    /// `ceil(total / limit)`.
    pub pages: usize,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Slices `items` to the requested page.
///
/// ## Example
/// ```rust
/// use mobilia_core::page::paginate;
///
/// let page = paginate((1..=45).collect::<Vec<_>>(), 3, 20).unwrap();
/// assert_eq!(page.data, vec![41, 42, 43, 44, 45]);
/// assert_eq!(page.pagination.pages, 3);
/// ```
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> ValidationResult<Page<T>> {
    validate_page(page)?;
    validate_limit(limit)?;

    let total = items.len();
    let pages = total.div_ceil(limit);
    let start = (page - 1).saturating_mul(limit);

    let data = items.into_iter().skip(start).take(limit).collect();

    Ok(Page {
        data,
        pagination: Pagination {
            page,
            limit,
            total,
            pages,
        },
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
