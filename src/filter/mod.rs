//! Row filters
//!
//! Report, page and visual filters narrow the raw rows before shaping. A
//! filter is persisted either as a predicate object or as a textual
//! expression such as `region in ("North", "South") and sales > 100`.
//!
//! Missing fields read as `Null`. Every comparison against `Null` is false;
//! only `is blank` matches it.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{CompareOp, Predicate};
pub use parser::parse_filter;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

use crate::data::{RawRow, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("empty filter expression")]
    Empty,
    #[error("invalid filter expression at position {position} near '{near}'")]
    Syntax { position: usize, near: String },
}

/// A persisted filter
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub predicate: Predicate,
}

impl Filter {
    pub fn new(predicate: Predicate) -> Self {
        Self { predicate }
    }

    pub fn matches(&self, row: &RawRow) -> bool {
        self.predicate.matches(row)
    }
}

impl FromStr for Filter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_filter(s).map(Filter::new)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilterRepr {
    Expression(String),
    Predicate(Predicate),
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match FilterRepr::deserialize(deserializer)? {
            FilterRepr::Expression(text) => text.parse().map_err(serde::de::Error::custom),
            FilterRepr::Predicate(predicate) => Ok(Filter::new(predicate)),
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.predicate.serialize(serializer)
    }
}

/// Rows passing every filter, in input order. Rows are shared, not copied.
pub fn apply_filters<'a, I>(rows: &[RawRow], filters: I) -> Vec<RawRow>
where
    I: IntoIterator<Item = &'a Filter>,
{
    let filters: Vec<&Filter> = filters.into_iter().collect();
    if filters.is_empty() {
        return rows.to_vec();
    }
    let kept: Vec<RawRow> = rows.iter().filter(|row| filters.iter().all(|f| f.matches(row))).cloned().collect();
    log::debug!("Filters kept {} of {} rows", kept.len(), rows.len());
    kept
}

// =============================================================================
// Evaluation
// =============================================================================

impl Predicate {
    pub fn matches(&self, row: &RawRow) -> bool {
        match self {
            Predicate::Compare { field, op: CompareOp::Ne, value } => {
                // Values of different kinds are unequal; Null still never matches
                let lhs = row.get(field);
                !lhs.is_null() && !value.is_null() && compare(lhs, value) != Some(Ordering::Equal)
            }
            Predicate::Compare { field, op, value } => {
                compare(row.get(field), value).is_some_and(|ordering| match op {
                    CompareOp::Eq => ordering == Ordering::Equal,
                    CompareOp::Ne => ordering != Ordering::Equal,
                    CompareOp::Lt => ordering == Ordering::Less,
                    CompareOp::Le => ordering != Ordering::Greater,
                    CompareOp::Gt => ordering == Ordering::Greater,
                    CompareOp::Ge => ordering != Ordering::Less,
                })
            }
            Predicate::In { field, values, negated } => {
                let lhs = row.get(field);
                if lhs.is_null() {
                    return false;
                }
                let found = values.iter().any(|v| compare(lhs, v) == Some(Ordering::Equal));
                found != *negated
            }
            Predicate::IsBlank { field, negated } => is_blank(row.get(field)) != *negated,
            Predicate::Contains { field, value } => {
                text_of(row.get(field)).is_some_and(|text| text.to_lowercase().contains(&value.to_lowercase()))
            }
            Predicate::StartsWith { field, value } => {
                text_of(row.get(field)).is_some_and(|text| text.to_lowercase().starts_with(&value.to_lowercase()))
            }
            Predicate::And { predicates } => predicates.iter().all(|p| p.matches(row)),
            Predicate::Or { predicates } => predicates.iter().any(|p| p.matches(row)),
            Predicate::Not { predicate } => !predicate.matches(row),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    value.is_null() || value.as_str().is_some_and(|s| s.trim().is_empty())
}

fn text_of(value: &Value) -> Option<Cow<'_, str>> {
    if value.is_null() {
        return None;
    }
    Some(value.as_str().map_or_else(|| Cow::Owned(value.display()), Cow::Borrowed))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Order of a row value against a literal; `None` when they cannot be compared
fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Number(_), _) | (_, Value::Number(_)) => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Text(s)) => Some(a.cmp(&parse_bool(s)?)),
        (Value::Text(s), Value::Bool(b)) => Some(parse_bool(s)?.cmp(b)),
        _ => Some(text_of(lhs)?.as_ref().cmp(text_of(rhs)?.as_ref())),
    }
}
