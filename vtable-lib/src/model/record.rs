//! Dynamic record and the field-lookup trait rows must implement

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::Value;
use crate::error::FieldError;

/// Field lookup capability required from every row held by a
/// [`Store`](crate::Store).
///
/// This is the only thing the engine knows about a row. Filters and sort keys
/// name fields by path; dotted paths (`"address.city"`) descend through nested
/// [`Value::Record`] values.
///
/// # Example
///
/// ```
/// use vtable_lib::model::{Row, Value};
///
/// struct User {
///     name: Value,
/// }
///
/// impl Row for User {
///     fn field(&self, name: &str) -> Option<&Value> {
///         match name {
///             "name" => Some(&self.name),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Row {
    /// Returns the value of a top-level field.
    fn field(&self, name: &str) -> Option<&Value>;

    /// Resolves a field path.
    ///
    /// An exact top-level match wins over splitting the path on dots.
    fn lookup(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.field(path) {
            return Some(value);
        }
        let mut segments = path.split('.');
        let mut current = self.field(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Record(record) => record.field(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl Row for HashMap<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Row for BTreeMap<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// A schema-less record.
///
/// Records hold field values as a `HashMap<String, Value>` and serialize as a
/// plain JSON object. Typed getter methods provide checked access.
///
/// # Example
///
/// ```
/// use vtable_lib::model::Record;
///
/// let record = Record::new()
///     .set("id", 1)
///     .set("name", "Ann");
///
/// assert_eq!(record.get_string("name").unwrap(), Some("Ann"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: HashMap<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    // =========================================================================
    // Typed getters
    //
    // Paths resolve like filter and sort keys. A missing path or a value of
    // another type is an error; an explicit null is Ok(None).
    // =========================================================================

    fn typed<'a, T>(
        &'a self,
        path: &str,
        expected: &'static str,
        pick: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<Option<T>, FieldError> {
        match self.lookup(path) {
            None => Err(FieldError::missing(path)),
            Some(Value::Null) => Ok(None),
            Some(value) => pick(value)
                .map(Some)
                .ok_or_else(|| FieldError::wrong_type(path, expected, value)),
        }
    }

    /// Gets a string.
    pub fn get_string(&self, path: &str) -> Result<Option<&str>, FieldError> {
        self.typed(path, "string", Value::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Result<Option<bool>, FieldError> {
        self.typed(path, "bool", |value| match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        })
    }

    /// Gets an integer, widening `Int`.
    pub fn get_long(&self, path: &str) -> Result<Option<i64>, FieldError> {
        self.typed(path, "long", |value| match value {
            Value::Long(n) => Some(*n),
            Value::Int(n) => Some(i64::from(*n)),
            _ => None,
        })
    }

    /// Gets any numeric value as `f64`.
    pub fn get_float(&self, path: &str) -> Result<Option<f64>, FieldError> {
        self.typed(path, "number", Value::as_number)
    }

    pub fn get_datetime(&self, path: &str) -> Result<Option<DateTime<Utc>>, FieldError> {
        self.typed(path, "datetime", |value| match value {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        })
    }

    /// Gets a nested record.
    pub fn get_record(&self, path: &str) -> Result<Option<&Record>, FieldError> {
        self.typed(path, "record", |value| match value {
            Value::Record(record) => Some(&**record),
            _ => None,
        })
    }
}

impl Row for Record {
    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl From<HashMap<String, Value>> for Record {
    fn from(fields: HashMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
