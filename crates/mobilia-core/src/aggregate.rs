//! # Aggregation
//!
//! Numeric roll-ups over one field of a result set.
//!
//! ## Rules
//! - Only `Number` values take part in sum/avg/min/max; strings such as
//!   `"50"` are skipped, never parsed.
//! - `count` counts matching records, numeric or not.
//! - Empty inputs yield `0` for every operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::record::Record;

/// Supported aggregate operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl FromStr for AggregateOp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(AggregateOp::Sum),
            "avg" | "average" => Ok(AggregateOp::Avg),
            "min" => Ok(AggregateOp::Min),
            "max" => Ok(AggregateOp::Max),
            "count" => Ok(AggregateOp::Count),
            other => Err(CoreError::InvalidAggregateOperation(other.to_string())),
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Count => "count",
        };
        f.write_str(name)
    }
}

/// Computes `op` over `field` for the given records.
///
/// ## Example
/// ```rust
/// use mobilia_core::aggregate::{aggregate, AggregateOp};
///
/// let records: Vec<mobilia_core::Record> = Vec::new();
/// assert_eq!(aggregate(&records, "price", AggregateOp::Avg), 0.0);
/// ```
pub fn aggregate(records: &[Record], field: &str, op: AggregateOp) -> f64 {
    if op == AggregateOp::Count {
        return records.len() as f64;
    }

    let values: Vec<f64> = records
        .iter()
        .filter_map(|record| record.value(field).as_f64())
        .collect();

    if values.is_empty() {
        return 0.0;
    }

    match op {
        AggregateOp::Sum => values.iter().sum(),
        AggregateOp::Avg => values.iter().sum::<f64>() / values.len() as f64,
        AggregateOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        AggregateOp::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggregateOp::Count => records.len() as f64,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
