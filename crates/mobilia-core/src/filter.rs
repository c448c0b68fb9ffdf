//! # Filters
//!
//! Condition sets evaluated against records by the query engine.
//!
//! ## Condition Forms
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  { "category": "sofa" }                          bare value → equality  │
//! │  { "stock": { "operator": "gt", "operand": 0 } } operator condition     │
//! │                                                                         │
//! │  Operators: eq ne gt gte lt lte in like                                │
//! │  Unknown operator names fall back to equality against the operand.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A record matches a filter iff every condition holds. Condition order is
//! kept: the store uses it to pick which indexed field narrows a query.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

use crate::error::CoreError;
use crate::record::Record;
use crate::value::Value;

// =============================================================================
// Operator
// =============================================================================

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Operand is a set; the field value must be a member.
    In,
    /// Case-insensitive substring match on the field's display form.
    Like,
}

impl Operator {
    /// Parses an operator name, degrading unknown names to `Eq`.
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or(Operator::Eq)
    }

    /// Applies the operator to a field value.
    pub fn apply(&self, actual: &Value, operand: &Value) -> bool {
        match self {
            Operator::Eq => actual == operand,
            Operator::Ne => actual != operand,
            Operator::Gt => actual.compare(operand).is_some_and(|o| o.is_gt()),
            Operator::Gte => actual.compare(operand).is_some_and(|o| o.is_ge()),
            Operator::Lt => actual.compare(operand).is_some_and(|o| o.is_lt()),
            Operator::Lte => actual.compare(operand).is_some_and(|o| o.is_le()),
            Operator::In => match operand {
                Value::Array(members) => members.contains(actual),
                single => actual == single,
            },
            Operator::Like => {
                if actual.is_null() {
                    return false;
                }
                let haystack = actual.to_string().to_lowercase();
                let needle = operand.to_string().to_lowercase();
                haystack.contains(&needle)
            }
        }
    }
}

impl FromStr for Operator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "in" => Ok(Operator::In),
            "like" => Ok(Operator::Like),
            other => Err(CoreError::InvalidOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::Like => "like",
        };
        f.write_str(name)
    }
}

// Incoming names come from UI code; unknown ones degrade instead of failing.
impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Operator::parse_lenient(&name))
    }
}

// =============================================================================
// Condition
// =============================================================================

/// One condition on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// `{ operator, operand }` form.
    Compare { operator: Operator, operand: Value },
    /// Bare value: equality.
    Equals(Value),
}

impl Condition {
    pub fn compare(operator: Operator, operand: impl Into<Value>) -> Self {
        Condition::Compare {
            operator,
            operand: operand.into(),
        }
    }

    /// Evaluates the condition against a field value.
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Condition::Equals(expected) => actual == expected,
            Condition::Compare { operator, operand } => operator.apply(actual, operand),
        }
    }

    /// The value an equality posting-list lookup can use, if any.
    pub fn equality_operand(&self) -> Option<&Value> {
        match self {
            Condition::Equals(expected) => Some(expected),
            Condition::Compare {
                operator: Operator::Eq,
                operand,
            } => Some(operand),
            Condition::Compare { .. } => None,
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

/// An ordered set of conditions, at most one per field.
///
/// ## Example
/// ```rust
/// use mobilia_core::filter::Filter;
///
/// let filter = Filter::new()
///     .eq("category", "chair")
///     .gt("stock", 0)
///     .like("name", "oak");
/// assert_eq!(filter.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    /// An empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition, replacing any existing one on the same field.
    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        let field = field.into();
        match self.conditions.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = condition,
            None => self.conditions.push((field, condition)),
        }
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Equals(value.into()))
    }

    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::compare(Operator::Ne, value))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::compare(Operator::Gt, value))
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::compare(Operator::Gte, value))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::compare(Operator::Lt, value))
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::compare(Operator::Lte, value))
    }

    pub fn is_in(self, field: impl Into<String>, members: Vec<Value>) -> Self {
        self.with(field, Condition::compare(Operator::In, Value::Array(members)))
    }

    pub fn like(self, field: impl Into<String>, needle: impl Into<Value>) -> Self {
        self.with(field, Condition::compare(Operator::Like, needle))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Conditions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(f, c)| (f.as_str(), c))
    }

    /// True iff every condition holds for the record.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(&record.value(field)))
    }

    /// Full scan: every matching record, in input order.
    pub fn scan<'a, I>(&self, records: I) -> Vec<Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

impl<F: Into<String>> FromIterator<(F, Condition)> for Filter {
    fn from_iter<I: IntoIterator<Item = (F, Condition)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Filter::new(), |filter, (field, condition)| {
                filter.with(field, condition)
            })
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.conditions.len()))?;
        for (field, condition) in &self.conditions {
            map.serialize_entry(field, condition)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FilterVisitor;

        impl<'de> Visitor<'de> for FilterVisitor {
            type Value = Filter;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to conditions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Filter, A::Error> {
                let mut filter = Filter::new();
                while let Some((field, condition)) = access.next_entry::<String, Condition>()? {
                    filter = filter.with(field, condition);
                }
                Ok(filter)
            }
        }

        deserializer.deserialize_map(FilterVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
