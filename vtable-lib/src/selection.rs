//! Selection state management.
//!
//! Rows are tracked by identity: two rows are the same row only if they are
//! the same `Arc` allocation. Structurally equal copies are distinct rows.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Selection mode for a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectionMode {
    /// At most one row is selected; selecting replaces the selection.
    #[default]
    Single,
    /// Any number of rows can be selected.
    Multiple,
}

impl SelectionMode {
    /// Returns the configuration name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Single => "single",
            SelectionMode::Multiple => "multiple",
        }
    }
}

impl FromStr for SelectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(SelectionMode::Single),
            "multiple" => Ok(SelectionMode::Multiple),
            _ => Err(ConfigError::InvalidSelectionMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for SelectionMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SelectionMode> for String {
    fn from(mode: SelectionMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` if `row` is the same allocation as one of `rows`.
pub fn contains_row<R>(rows: &[Arc<R>], row: &Arc<R>) -> bool {
    rows.iter().any(|r| Arc::ptr_eq(r, row))
}

/// Identity-based, insertion-ordered selection.
///
/// All mutators return whether anything changed so callers can skip
/// recomputation on no-ops.
pub struct Selection<R> {
    selected: Vec<Arc<R>>,
}

impl<R> Selection<R> {
    /// Create a new empty selection.
    pub fn new() -> Self {
        Self {
            selected: Vec::new(),
        }
    }

    /// Selected rows, in selection order.
    pub fn selected(&self) -> &[Arc<R>] {
        &self.selected
    }

    /// Check if a row is selected.
    pub fn contains(&self, row: &Arc<R>) -> bool {
        contains_row(&self.selected, row)
    }

    /// Get the number of selected rows.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Select a row.
    ///
    /// In single mode the row replaces the whole selection. In multiple mode
    /// it is appended unless already present.
    pub fn select(&mut self, row: &Arc<R>, mode: SelectionMode) -> bool {
        match mode {
            SelectionMode::Single => {
                if self.selected.len() == 1 && Arc::ptr_eq(&self.selected[0], row) {
                    return false;
                }
                self.selected.clear();
                self.selected.push(Arc::clone(row));
                true
            }
            SelectionMode::Multiple => {
                if self.contains(row) {
                    return false;
                }
                self.selected.push(Arc::clone(row));
                true
            }
        }
    }

    /// Deselect a row. No-op if it is not selected.
    pub fn deselect(&mut self, row: &Arc<R>) -> bool {
        let before = self.selected.len();
        self.selected.retain(|r| !Arc::ptr_eq(r, row));
        self.selected.len() != before
    }

    /// Replace the selection with `rows`.
    ///
    /// Rejected (returns `false`) in single mode.
    pub fn select_all(&mut self, rows: &[Arc<R>], mode: SelectionMode) -> bool {
        if mode != SelectionMode::Multiple {
            return false;
        }
        let unchanged = self.selected.len() == rows.len()
            && self
                .selected
                .iter()
                .zip(rows)
                .all(|(a, b)| Arc::ptr_eq(a, b));
        if unchanged {
            return false;
        }
        self.selected = rows.to_vec();
        true
    }

    /// Clear all selection.
    /// Returns the rows that were deselected.
    pub fn clear(&mut self) -> Vec<Arc<R>> {
        std::mem::take(&mut self.selected)
    }

    /// Drop every selected row that is no longer part of `data`.
    /// Returns the rows that were dropped.
    pub fn retain_present(&mut self, data: &[Arc<R>]) -> Vec<Arc<R>> {
        if self.selected.is_empty() {
            return Vec::new();
        }
        let present: HashSet<*const R> = data.iter().map(Arc::as_ptr).collect();
        let (kept, dropped): (Vec<_>, Vec<_>) = self
            .selected
            .drain(..)
            .partition(|row| present.contains(&Arc::as_ptr(row)));
        self.selected = kept;
        dropped
    }

    /// Bring the selection in line with `mode`.
    ///
    /// Single mode keeps only the most recently selected row.
    pub fn enforce_mode(&mut self, mode: SelectionMode) -> bool {
        if mode == SelectionMode::Single && self.selected.len() > 1 {
            let last = self.selected.len() - 1;
            self.selected.drain(..last);
            return true;
        }
        false
    }
}

impl<R> Default for Selection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for Selection<R> {
    fn clone(&self) -> Self {
        Self {
            selected: self.selected.clone(),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for Selection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("selected", &self.selected)
            .finish()
    }
}
