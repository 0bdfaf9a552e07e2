//! Dynamic field values, their text form and their ordering

use std::cmp::Ordering;

use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// A dynamic value that can be stored in a record field.
///
/// Records never carry a schema, so every field is a `Value`. Filtering and
/// sorting only ever look at a value through [`Value::to_text`] and
/// [`Value::compare`].
///
/// # Example
///
/// ```
/// use vtable_lib::model::Value;
///
/// let name = Value::from("Ann");
/// let age = Value::from(42i64);
/// let active = Value::from(true);
/// let empty = Value::Null;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value; renders as the empty string.
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f64),
    /// Text. Numeric-looking strings stay strings.
    String(String),
    Decimal(Decimal),
    Guid(Uuid),
    /// UTC timestamp, compared chronologically.
    DateTime(DateTime<Utc>),
    /// Ordered list, rendered comma-joined.
    List(Vec<Value>),
    /// Nested record, reachable through dotted field paths.
    Record(Box<super::Record>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Guid(_) => "guid",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    /// Returns the numeric value for `Int`, `Long`, `Float` and `Decimal`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(f64::from(*n)),
            Value::Long(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Returns the string slice for `String` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Coerces the value to display text.
    ///
    /// Null renders as the empty string, integral floats drop their fraction
    /// and lists are joined with commas.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Long(n) => n.to_string(),
            Value::Float(n) => format_float(*n),
            Value::Decimal(d) => d.normalize().to_string(),
            Value::String(s) => s.clone(),
            Value::Guid(g) => g.to_string(),
            Value::DateTime(dt) => dt.to_rfc3339(),
            Value::List(items) => items
                .iter()
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Record(record) => serde_json::to_string(record).unwrap_or_default(),
        }
    }

    /// Default ordering used when no custom comparator is configured.
    ///
    /// Numbers compare numerically, strings with [`collate`], date-times
    /// chronologically. Any other pairing (including null, which counts as the
    /// empty string) falls back to collating the text forms.
    pub fn compare(&self, other: &Value) -> Ordering {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        }
        match (self, other) {
            (Value::String(a), Value::String(b)) => collate(a, b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => collate(&self.to_text(), &other.to_text()),
        }
    }
}

fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Locale-style string collation.
///
/// Strings are first compared case-insensitively; ties are broken so that a
/// lowercase letter sorts before its uppercase form, then by code point.
pub fn collate(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    if folded != Ordering::Equal {
        return folded;
    }
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            return match (ca.is_lowercase(), cb.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => ca.cmp(&cb),
            };
        }
    }
    a.len().cmp(&b.len())
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<super::Record> for Value {
    fn from(v: super::Record) -> Self {
        Value::Record(Box::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_coercion() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Float(3.0).to_text(), "3");
        assert_eq!(Value::Float(2.5).to_text(), "2.5");
        assert_eq!(
            Value::List(vec![Value::from(1), Value::from("a")]).to_text(),
            "1,a"
        );
    }

    #[test]
    fn test_collate_is_case_insensitive_first() {
        assert_eq!(collate("ann", "Bob"), Ordering::Less);
        assert_eq!(collate("Ann", "Anna"), Ordering::Less);
        assert_eq!(collate("a", "A"), Ordering::Less);
        assert_eq!(collate("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_compare_mixed_numbers() {
        assert_eq!(Value::Int(2).compare(&Value::Float(10.0)), Ordering::Less);
        assert_eq!(Value::Long(5).compare(&Value::Int(5)), Ordering::Equal);
    }

    #[test]
    fn test_compare_null_as_empty_string() {
        assert_eq!(Value::Null.compare(&Value::from("a")), Ordering::Less);
        assert_eq!(Value::Null.compare(&Value::from("")), Ordering::Equal);
    }
}
