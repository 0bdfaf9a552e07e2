//! Configuration errors

/// Error raised at the configuration boundary, before anything reaches a
/// [`Store`](crate::Store).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Selection mode other than `single` or `multiple`.
    #[error("Invalid selection mode '{0}': expected 'single' or 'multiple'")]
    InvalidSelectionMode(String),

    /// Sort order other than `asc`, `desc` or `none`.
    #[error("Invalid sort order '{0}': expected 'asc', 'desc' or 'none'")]
    InvalidSortOrder(String),

    /// Malformed JSON configuration.
    #[error("Failed to parse table configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration could not be read.
    #[error("Failed to read table configuration: {0}")]
    Io(#[from] std::io::Error),
}
