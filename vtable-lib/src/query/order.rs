//! Sort specification and the comparator engine.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::error::CallbackError;
use crate::error::ConfigError;
use crate::error::TableError;
use crate::model::Row;
use crate::model::Value;

/// Key extractor signature: `(row, order) -> sort value`.
pub type ExtractorFn<R> = dyn Fn(&R, SortOrder) -> Result<Value, CallbackError> + Send + Sync;

/// Custom comparator signature: `(a, b, order) -> ordering`.
pub type ComparatorFn<R> =
    dyn Fn(&R, &R, SortOrder) -> Result<Ordering, CallbackError> + Send + Sync;

/// Sort direction.
///
/// The discriminants match the multiplier applied to a comparison result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Descending order (Z-A, 9-0).
    Desc = -1,
    /// Unsorted: rows keep their filtered order.
    #[default]
    None = 0,
    /// Ascending order (A-Z, 0-9).
    Asc = 1,
}

impl SortOrder {
    /// Applies this direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
            SortOrder::None => Ordering::Equal,
        }
    }

    /// Order a header moves to when clicked.
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc | SortOrder::None => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            "none" => Ok(SortOrder::None),
            _ => Err(ConfigError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// What a row is sorted by.
pub enum SortKey<R> {
    /// Field path, resolved with [`Row::lookup`].
    Path(String),
    /// Function computing the sort value.
    Extractor(Arc<ExtractorFn<R>>),
}

impl<R> SortKey<R> {
    /// Sorts by a field path.
    pub fn path(path: impl Into<String>) -> Self {
        SortKey::Path(path.into())
    }

    /// Sorts by the value an infallible function computes.
    pub fn extractor<F>(f: F) -> Self
    where
        F: Fn(&R, SortOrder) -> Value + Send + Sync + 'static,
    {
        Self::try_extractor(move |row, order| Ok(f(row, order)))
    }

    /// Sorts by the value a fallible function computes.
    pub fn try_extractor<F>(f: F) -> Self
    where
        F: Fn(&R, SortOrder) -> Result<Value, CallbackError> + Send + Sync + 'static,
    {
        SortKey::Extractor(Arc::new(f))
    }
}

impl<R: Row> SortKey<R> {
    /// Resolves the sort value of a row. Missing fields resolve to `Null`.
    pub fn extract(&self, row: &R, order: SortOrder) -> Result<Value, CallbackError> {
        match self {
            SortKey::Path(path) => Ok(row.lookup(path).cloned().unwrap_or_default()),
            SortKey::Extractor(f) => f(row, order),
        }
    }
}

impl<R> Clone for SortKey<R> {
    fn clone(&self) -> Self {
        match self {
            SortKey::Path(path) => SortKey::Path(path.clone()),
            SortKey::Extractor(f) => SortKey::Extractor(Arc::clone(f)),
        }
    }
}

impl<R> PartialEq for SortKey<R> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SortKey::Path(a), SortKey::Path(b)) => a == b,
            (SortKey::Extractor(a), SortKey::Extractor(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<R> fmt::Debug for SortKey<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Path(path) => f.debug_tuple("Path").field(path).finish(),
            SortKey::Extractor(_) => f.write_str("Extractor(..)"),
        }
    }
}

impl<R> From<&str> for SortKey<R> {
    fn from(path: &str) -> Self {
        SortKey::Path(path.to_string())
    }
}

impl<R> From<String> for SortKey<R> {
    fn from(path: String) -> Self {
        SortKey::Path(path)
    }
}

/// Comparator that replaces the default value comparison entirely.
///
/// It receives the active [`SortOrder`] and alone decides how to honor it.
pub struct CustomSort<R>(Arc<ComparatorFn<R>>);

impl<R> CustomSort<R> {
    /// Wraps an infallible comparator.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&R, &R, SortOrder) -> Ordering + Send + Sync + 'static,
    {
        Self::try_new(move |a, b, order| Ok(f(a, b, order)))
    }

    /// Wraps a fallible comparator.
    pub fn try_new<F>(f: F) -> Self
    where
        F: Fn(&R, &R, SortOrder) -> Result<Ordering, CallbackError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the comparator.
    pub fn compare(&self, a: &R, b: &R, order: SortOrder) -> Result<Ordering, CallbackError> {
        (self.0)(a, b, order)
    }
}

impl<R> Clone for CustomSort<R> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<R> PartialEq for CustomSort<R> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<R> fmt::Debug for CustomSort<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomSort(..)")
    }
}

/// The active sort: key, order, optional comparator and the id of the header
/// that owns it.
///
/// # Example
///
/// ```
/// use vtable_lib::model::Record;
/// use vtable_lib::query::{SortOrder, SortSpec};
///
/// let spec: SortSpec<Record> = SortSpec::asc("name");
/// assert_eq!(spec.order, SortOrder::Asc);
///
/// let by_name: SortSpec<Record> = SortSpec::by("name", SortOrder::Desc).with_id("name-col");
/// ```
#[derive(Debug)]
pub struct SortSpec<R> {
    /// What rows are sorted by. `None` with no custom comparator leaves rows unsorted.
    pub key: Option<SortKey<R>>,
    /// Sort direction.
    pub order: SortOrder,
    /// Comparator overriding the default value comparison.
    pub custom: Option<CustomSort<R>>,
    /// Identifier of the header that owns this sort.
    pub id: Option<String>,
}

impl<R> SortSpec<R> {
    /// No sorting.
    pub fn none() -> Self {
        Self {
            key: None,
            order: SortOrder::None,
            custom: None,
            id: None,
        }
    }

    /// Sorts by a key in the given order.
    pub fn by(key: impl Into<SortKey<R>>, order: SortOrder) -> Self {
        Self {
            key: Some(key.into()),
            order,
            custom: None,
            id: None,
        }
    }

    /// Sorts ascending by a key.
    pub fn asc(key: impl Into<SortKey<R>>) -> Self {
        Self::by(key, SortOrder::Asc)
    }

    /// Sorts descending by a key.
    pub fn desc(key: impl Into<SortKey<R>>) -> Self {
        Self::by(key, SortOrder::Desc)
    }

    /// Sorts with a custom comparator in the given order.
    pub fn custom(custom: CustomSort<R>, order: SortOrder) -> Self {
        Self {
            key: None,
            order,
            custom: Some(custom),
            id: None,
        }
    }

    /// Sets the owning header id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the custom comparator.
    pub fn with_custom(mut self, custom: CustomSort<R>) -> Self {
        self.custom = Some(custom);
        self
    }

    /// Returns `true` when a sort pass would run.
    pub fn is_active(&self) -> bool {
        self.order != SortOrder::None && (self.key.is_some() || self.custom.is_some())
    }
}

impl<R: Row> SortSpec<R> {
    /// Three-way comparison of two rows.
    ///
    /// Returns `Equal` for every pair when the spec is inactive.
    pub fn compare(&self, a: &R, b: &R) -> Result<Ordering, CallbackError> {
        if self.order == SortOrder::None {
            return Ok(Ordering::Equal);
        }
        if let Some(custom) = &self.custom {
            return custom.compare(a, b, self.order);
        }
        match &self.key {
            Some(key) => {
                let va = key.extract(a, self.order)?;
                let vb = key.extract(b, self.order)?;
                Ok(self.order.apply(va.compare(&vb)))
            }
            None => Ok(Ordering::Equal),
        }
    }

    /// Stable sort of `rows` in place.
    ///
    /// The first callback failure is returned once the pass finishes; the
    /// order of `rows` is unspecified in that case.
    pub fn sort(&self, rows: &mut [Arc<R>]) -> Result<(), TableError> {
        if !self.is_active() {
            return Ok(());
        }
        let mut failure: Option<CallbackError> = None;
        rows.sort_by(|a, b| {
            if failure.is_some() {
                return Ordering::Equal;
            }
            match self.compare(a, b) {
                Ok(ordering) => ordering,
                Err(e) => {
                    failure = Some(e);
                    Ordering::Equal
                }
            }
        });
        match failure {
            Some(source) => Err(TableError::sort(source)),
            None => Ok(()),
        }
    }
}

impl<R> Default for SortSpec<R> {
    fn default() -> Self {
        Self::none()
    }
}

impl<R> Clone for SortSpec<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            order: self.order,
            custom: self.custom.clone(),
            id: self.id.clone(),
        }
    }
}

impl<R> PartialEq for SortSpec<R> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.order == other.order
            && self.custom == other.custom
            && self.id == other.id
    }
}
