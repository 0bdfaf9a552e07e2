//! Filter definitions and the predicate engine.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::error::CallbackError;
use crate::error::TableError;
use crate::model::Row;
use crate::model::Value;

/// Predicate signature of a [`CustomFilter`]: `(filter value, row) -> matches`.
pub type PredicateFn<R> = dyn Fn(Option<&Value>, &R) -> Result<bool, CallbackError> + Send + Sync;

/// Case-insensitive text search across one or more fields.
///
/// A row matches when at least one of `keys` resolves to a non-null value
/// whose text contains `value` (or equals it, when `exact` is set). A blank
/// `value` makes the filter inactive.
///
/// # Example
///
/// ```
/// use vtable_lib::query::BasicFilter;
///
/// let filter = BasicFilter::new("an", ["name", "email"]);
/// let exact = BasicFilter::new("Ann", ["name"]).exact();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicFilter {
    /// Text to search for.
    pub value: String,
    /// Field paths to search in.
    pub keys: Vec<String>,
    /// Require case-insensitive equality instead of substring containment.
    #[serde(default)]
    pub exact: bool,
}

impl BasicFilter {
    /// Creates a substring filter over the given field paths.
    pub fn new<K>(value: impl Into<String>, keys: impl IntoIterator<Item = K>) -> Self
    where
        K: Into<String>,
    {
        Self {
            value: value.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            exact: false,
        }
    }

    /// Switches the filter to exact matching.
    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    /// Returns `false` when the search text is blank.
    pub fn is_active(&self) -> bool {
        !self.value.trim().is_empty()
    }

    /// Tests a row against this filter.
    pub fn matches<R: Row + ?Sized>(&self, row: &R) -> bool {
        if !self.is_active() {
            return true;
        }
        let needle = self.value.to_lowercase();
        self.keys.iter().any(|key| match row.lookup(key) {
            None | Some(Value::Null) => false,
            Some(value) => {
                let haystack = value.to_text().to_lowercase();
                if self.exact {
                    haystack == needle
                } else {
                    haystack.contains(&needle)
                }
            }
        })
    }
}

/// Filter backed by a user predicate.
///
/// The optional `value` is handed to the predicate untouched; the engine
/// never interprets it. Two custom filters are equal when their values are
/// equal and they share the same predicate instance.
pub struct CustomFilter<R> {
    /// Opaque argument passed to the predicate.
    pub value: Option<Value>,
    predicate: Arc<PredicateFn<R>>,
}

impl<R> CustomFilter<R> {
    /// Creates a custom filter from an infallible predicate.
    pub fn new<F>(value: Option<Value>, predicate: F) -> Self
    where
        F: Fn(Option<&Value>, &R) -> bool + Send + Sync + 'static,
    {
        Self::try_new(value, move |value, row| Ok(predicate(value, row)))
    }

    /// Creates a custom filter from a fallible predicate.
    pub fn try_new<F>(value: Option<Value>, predicate: F) -> Self
    where
        F: Fn(Option<&Value>, &R) -> Result<bool, CallbackError> + Send + Sync + 'static,
    {
        Self {
            value,
            predicate: Arc::new(predicate),
        }
    }

    /// Returns a copy of this filter carrying a different value.
    ///
    /// The predicate instance is shared with the original.
    pub fn with_value(&self, value: Option<Value>) -> Self {
        Self {
            value,
            predicate: Arc::clone(&self.predicate),
        }
    }

    /// Runs the predicate against a row.
    pub fn matches(&self, row: &R) -> Result<bool, CallbackError> {
        (self.predicate)(self.value.as_ref(), row)
    }
}

impl<R> Clone for CustomFilter<R> {
    fn clone(&self) -> Self {
        self.with_value(self.value.clone())
    }
}

impl<R> PartialEq for CustomFilter<R> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

impl<R> fmt::Debug for CustomFilter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFilter")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// A single named entry of a [`FilterSet`].
#[derive(Debug)]
pub enum Filter<R> {
    /// Text search over field paths.
    Basic(BasicFilter),
    /// User predicate.
    Custom(CustomFilter<R>),
}

impl<R: Row> Filter<R> {
    /// Creates a basic substring filter.
    pub fn basic<K>(value: impl Into<String>, keys: impl IntoIterator<Item = K>) -> Self
    where
        K: Into<String>,
    {
        Filter::Basic(BasicFilter::new(value, keys))
    }

    /// Creates a custom filter from an infallible predicate.
    pub fn custom<F>(value: impl Into<Value>, predicate: F) -> Self
    where
        F: Fn(Option<&Value>, &R) -> bool + Send + Sync + 'static,
    {
        let value = match value.into() {
            Value::Null => None,
            other => Some(other),
        };
        Filter::Custom(CustomFilter::new(value, predicate))
    }

    /// Tests a row against this filter.
    pub fn matches(&self, row: &R) -> Result<bool, CallbackError> {
        match self {
            Filter::Basic(filter) => Ok(filter.matches(row)),
            Filter::Custom(filter) => filter.matches(row),
        }
    }
}

impl<R> Clone for Filter<R> {
    fn clone(&self) -> Self {
        match self {
            Filter::Basic(filter) => Filter::Basic(filter.clone()),
            Filter::Custom(filter) => Filter::Custom(filter.clone()),
        }
    }
}

impl<R> PartialEq for Filter<R> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Filter::Basic(a), Filter::Basic(b)) => a == b,
            (Filter::Custom(a), Filter::Custom(b)) => a == b,
            _ => false,
        }
    }
}

impl<R> From<BasicFilter> for Filter<R> {
    fn from(filter: BasicFilter) -> Self {
        Filter::Basic(filter)
    }
}

impl<R> From<CustomFilter<R>> for Filter<R> {
    fn from(filter: CustomFilter<R>) -> Self {
        Filter::Custom(filter)
    }
}

/// Named filters, all of which a row must satisfy.
///
/// Entries are evaluated in name order so that the first failing predicate
/// is reported deterministically; the order has no effect on the result.
///
/// # Example
///
/// ```
/// use vtable_lib::model::Record;
/// use vtable_lib::query::{Filter, FilterSet};
///
/// let filters: FilterSet<Record> = FilterSet::new()
///     .with("search", Filter::basic("an", ["name"]))
///     .with("adults", Filter::custom(18, |min, row: &Record| {
///         let min = min.and_then(|v| v.as_number()).unwrap_or(0.0);
///         row.get("age").and_then(|v| v.as_number()).is_some_and(|age| age >= min)
///     }));
/// ```
#[derive(Debug)]
pub struct FilterSet<R> {
    filters: BTreeMap<String, Filter<R>>,
}

impl<R> FilterSet<R> {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self {
            filters: BTreeMap::new(),
        }
    }

    /// Adds a filter (builder pattern).
    pub fn with(mut self, name: impl Into<String>, filter: impl Into<Filter<R>>) -> Self {
        self.filters.insert(name.into(), filter.into());
        self
    }

    /// Inserts a filter, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, filter: impl Into<Filter<R>>) -> Option<Filter<R>> {
        self.filters.insert(name.into(), filter.into())
    }

    /// Removes a filter by name.
    pub fn remove(&mut self, name: &str) -> Option<Filter<R>> {
        self.filters.remove(name)
    }

    /// Returns a filter by name.
    pub fn get(&self, name: &str) -> Option<&Filter<R>> {
        self.filters.get(name)
    }

    /// Returns a mutable reference to a filter by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Filter<R>> {
        self.filters.get_mut(name)
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if there are no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterates over the filters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter<R>)> {
        self.filters.iter().map(|(name, filter)| (name.as_str(), filter))
    }
}

impl<R: Row> FilterSet<R> {
    /// Tests a row against every filter.
    pub fn matches(&self, row: &R) -> Result<bool, TableError> {
        for (name, filter) in &self.filters {
            if !filter
                .matches(row)
                .map_err(|source| TableError::filter(name.as_str(), source))?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Keeps the rows that pass every filter, preserving their order.
    pub fn apply(&self, rows: &[Arc<R>]) -> Result<Vec<Arc<R>>, TableError> {
        if self.filters.is_empty() {
            return Ok(rows.to_vec());
        }
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if self.matches(row)? {
                kept.push(Arc::clone(row));
            }
        }
        Ok(kept)
    }
}

impl<R> Default for FilterSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for FilterSet<R> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
        }
    }
}

impl<R> PartialEq for FilterSet<R> {
    fn eq(&self, other: &Self) -> bool {
        self.filters == other.filters
    }
}

impl<R> From<HashMap<String, BasicFilter>> for FilterSet<R> {
    fn from(filters: HashMap<String, BasicFilter>) -> Self {
        Self {
            filters: filters
                .into_iter()
                .map(|(name, filter)| (name, Filter::Basic(filter)))
                .collect(),
        }
    }
}

impl<R, N: Into<String>, F: Into<Filter<R>>> FromIterator<(N, F)> for FilterSet<R> {
    fn from_iter<I: IntoIterator<Item = (N, F)>>(iter: I) -> Self {
        Self {
            filters: iter
                .into_iter()
                .map(|(name, filter)| (name.into(), filter.into()))
                .collect(),
        }
    }
}
