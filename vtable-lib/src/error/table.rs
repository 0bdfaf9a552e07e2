//! Derivation errors

/// Error returned by a user-supplied predicate, extractor or comparator.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Error raised while deriving a table state.
///
/// The store never swallows these: they are returned from whichever
/// operation triggered the recompute, and the previous snapshot stays in
/// place.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A custom filter predicate failed.
    #[error("Filter '{name}' failed: {source}")]
    Filter {
        name: String,
        #[source]
        source: CallbackError,
    },

    /// A sort key extractor or custom comparator failed.
    #[error("Sort failed: {source}")]
    Sort {
        #[source]
        source: CallbackError,
    },
}

impl TableError {
    /// Creates a new filter error.
    pub fn filter(name: impl Into<String>, source: CallbackError) -> Self {
        Self::Filter {
            name: name.into(),
            source,
        }
    }

    /// Creates a new sort error.
    pub fn sort(source: CallbackError) -> Self {
        Self::Sort { source }
    }
}
