//! Pagination state and the page calculator.

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

/// Requested page and page size.
///
/// Both are optional. An unset (or zero) page size disables pagination; an
/// unset page is treated as the first page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub current_page: Option<usize>,
    /// Rows per page.
    pub page_size: Option<usize>,
}

impl Pagination {
    /// Creates an unpaginated state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the current page.
    pub fn with_current_page(mut self, current_page: usize) -> Self {
        self.current_page = Some(current_page);
        self
    }

    /// Returns the page size when pagination is active.
    pub fn effective_page_size(&self) -> Option<usize> {
        self.page_size.filter(|&size| size > 0)
    }

    /// Page on which the row at `index` of the ordered sequence lives.
    pub fn page_of(&self, index: usize) -> usize {
        match self.effective_page_size() {
            Some(size) => index / size + 1,
            None => 1,
        }
    }
}

/// One page of an ordered sequence.
#[derive(Debug, Clone)]
pub struct PageSlice<R> {
    /// Rows on the page.
    pub rows: Vec<Arc<R>>,
    /// Length of the ordered sequence.
    pub total_items: usize,
    /// Number of pages, never less than 1.
    pub total_pages: usize,
    /// Page actually shown, after clamping.
    pub current_page: usize,
    /// Whether a requested page fell outside `1..=total_pages`. Only a
    /// paginated slice ever clamps.
    pub clamped: bool,
}

/// Slices `ordered` according to `pagination`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vtable_lib::query::{Pagination, paginate};
///
/// let rows: Vec<Arc<u32>> = (1..=3).map(Arc::new).collect();
/// let page = paginate(&rows, Pagination::new().with_page_size(2).with_current_page(2));
///
/// assert_eq!(page.rows.len(), 1);
/// assert_eq!(page.total_pages, 2);
/// ```
pub fn paginate<R>(ordered: &[Arc<R>], pagination: Pagination) -> PageSlice<R> {
    let total_items = ordered.len();
    let Some(page_size) = pagination.effective_page_size() else {
        return PageSlice {
            rows: ordered.to_vec(),
            total_items,
            total_pages: 1,
            current_page: 1,
            clamped: false,
        };
    };

    let total_pages = total_items.div_ceil(page_size).max(1);
    let requested = pagination.current_page;
    let current_page = requested.unwrap_or(1).clamp(1, total_pages);
    let start = (current_page - 1) * page_size;
    let end = (start + page_size).min(total_items);

    PageSlice {
        rows: ordered.get(start..end).map(<[_]>::to_vec).unwrap_or_default(),
        total_items,
        total_pages,
        current_page,
        clamped: requested.is_some_and(|page| page != current_page),
    }
}
