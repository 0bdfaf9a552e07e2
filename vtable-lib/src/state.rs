//! Derived table snapshot.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeStruct;

use crate::selection::contains_row;

/// Immutable snapshot produced by every recompute.
///
/// Snapshots are shared as `Arc<TableState<R>>` and never change after
/// publication; a recompute builds a new one. Equality is by row identity:
/// two snapshots are equal when they reference the same row allocations in
/// the same order and carry the same counts.
pub struct TableState<R> {
    /// Full source data.
    pub data: Vec<Arc<R>>,
    /// Rows on the current page, filtered and sorted.
    pub rows: Vec<Arc<R>>,
    /// Selected rows, in selection order.
    pub selected_rows: Vec<Arc<R>>,
    /// Number of rows that pass the filters.
    pub total_items: usize,
    /// Number of pages, never less than 1.
    pub total_pages: usize,
    /// Page shown in `rows`, after clamping.
    pub current_page: usize,
}

impl<R> TableState<R> {
    /// Snapshot of a table with no data.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            rows: Vec::new(),
            selected_rows: Vec::new(),
            total_items: 0,
            total_pages: 1,
            current_page: 1,
        }
    }

    /// Returns `true` if `row` is selected.
    pub fn is_selected(&self, row: &Arc<R>) -> bool {
        contains_row(&self.selected_rows, row)
    }
}

fn same_rows<R>(a: &[Arc<R>], b: &[Arc<R>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Arc::ptr_eq(x, y))
}

impl<R> PartialEq for TableState<R> {
    fn eq(&self, other: &Self) -> bool {
        self.total_items == other.total_items
            && self.total_pages == other.total_pages
            && self.current_page == other.current_page
            && same_rows(&self.rows, &other.rows)
            && same_rows(&self.selected_rows, &other.selected_rows)
            && same_rows(&self.data, &other.data)
    }
}

impl<R> Default for TableState<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R> Clone for TableState<R> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            rows: self.rows.clone(),
            selected_rows: self.selected_rows.clone(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for TableState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableState")
            .field("rows", &self.rows)
            .field("selected_rows", &self.selected_rows)
            .field("total_items", &self.total_items)
            .field("total_pages", &self.total_pages)
            .field("current_page", &self.current_page)
            .finish_non_exhaustive()
    }
}

struct Rows<'a, R>(&'a [Arc<R>]);

impl<R: Serialize> Serialize for Rows<'_, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|row| &**row))
    }
}

// `data` is left out: it is the host's own input.
impl<R: Serialize> Serialize for TableState<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TableState", 5)?;
        state.serialize_field("rows", &Rows(&self.rows))?;
        state.serialize_field("selectedRows", &Rows(&self.selected_rows))?;
        state.serialize_field("totalItems", &self.total_items)?;
        state.serialize_field("totalPages", &self.total_pages)?;
        state.serialize_field("currentPage", &self.current_page)?;
        state.end()
    }
}
