//! # Field Values
//!
//! The tagged value type stored in every record field.
//!
//! ## Value Variants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Value                                           │
//! │                                                                         │
//! │  Null        missing or explicit null                                  │
//! │  Bool        in_stock: true                                            │
//! │  Number      price: 249.99, stock: 3 (always f64)                      │
//! │  String      name: "Oak Dining Chair"                                  │
//! │  Array       tags: ["oak", "dining"]                                   │
//! │  Object      dimensions: { width: 45, depth: 52 }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Form
//! Values serialize untagged, so a record blob is plain JSON and the
//! storefront can read it without knowing about this enum.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// A single field value.
///
/// Numbers are kept as `f64`: the persisted JSON does not distinguish
/// integers from decimals, and neither do comparisons.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(#[serde(serialize_with = "serialize_number")] f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

/// Whole numbers go out as JSON integers (`3`, not `3.0`).
fn serialize_number<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        serializer.serialize_i64(*n as i64)
    } else {
        serializer.serialize_f64(*n)
    }
}

impl Value {
    /// Returns the number if this is a `Number`.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `String`.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is an `Array`.
    #[inline]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for a number with no fractional part.
    pub fn is_integral(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_finite() && n.fract() == 0.0)
    }

    /// Short type name, used in log fields and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Orders two values of the same kind.
    ///
    /// Numbers compare numerically, strings lexicographically, booleans
    /// with `false < true`. Any other pairing is unordered, so `gt`/`lt`
    /// style conditions never match across kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Canonical posting-list key for this value.
    ///
    /// Two values produce the same key iff they are equal under `==`.
    /// Objects are keyed by their (sorted) JSON form.
    pub fn index_key(&self) -> String {
        match self {
            // -0.0 == 0.0 must share a posting list
            Value::Number(n) if *n == 0.0 => "n:0".to_string(),
            Value::Number(n) => format!("n:{}", n),
            Value::Null => "z:".to_string(),
            Value::Bool(b) => format!("b:{}", b),
            Value::String(s) => format!("s:{}", s),
            Value::Array(_) | Value::Object(_) => {
                format!("j:{}", serde_json::to_string(self).unwrap_or_default())
            }
        }
    }
}

/// Display form used for `like` matching and SQL literals.
///
/// Integral numbers print without a fractional part (`3`, not `3.0`);
/// arrays print their elements comma-joined; objects print as JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if self.is_integral() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Object(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
