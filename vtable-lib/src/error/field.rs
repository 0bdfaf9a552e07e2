//! Typed field access errors

use crate::model::Value;

/// Error returned by the typed getters on [`Record`](crate::model::Record).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// Nothing lives at the path.
    #[error("No field at '{path}'")]
    Missing { path: String },

    /// The value at the path has another type.
    #[error("Field '{path}' holds a {found}, not a {expected}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl FieldError {
    pub(crate) fn missing(path: &str) -> Self {
        Self::Missing {
            path: path.to_string(),
        }
    }

    pub(crate) fn wrong_type(path: &str, expected: &'static str, found: &Value) -> Self {
        Self::WrongType {
            path: path.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    /// Path of the offending field.
    pub fn path(&self) -> &str {
        match self {
            Self::Missing { path } | Self::WrongType { path, .. } => path,
        }
    }
}
