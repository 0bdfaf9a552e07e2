//! Inputs, memoization and the filter → sort → paginate pipeline.

use std::sync::Arc;

use log::debug;

use crate::config::TableOptions;
use crate::error::TableError;
use crate::model::Row;
use crate::notify::TableEvent;
use crate::notify::diff;
use crate::query::FilterSet;
use crate::query::Pagination;
use crate::query::SortSpec;
use crate::query::paginate;
use crate::selection::Selection;
use crate::selection::SelectionMode;
use crate::state::TableState;

/// Everything the host configures.
pub(super) struct Inputs<R> {
    pub data: Vec<Arc<R>>,
    pub filters: FilterSet<R>,
    pub sort: SortSpec<R>,
    pub pagination: Pagination,
    pub selection_mode: SelectionMode,
    pub options: TableOptions,
}

impl<R> Default for Inputs<R> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            filters: FilterSet::new(),
            sort: SortSpec::none(),
            pagination: Pagination::new(),
            selection_mode: SelectionMode::default(),
            options: TableOptions::default(),
        }
    }
}

/// Version counters of the inputs the ordered sequence depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct Versions {
    pub data: u64,
    pub filters: u64,
    pub sort: u64,
}

/// Filtered and sorted rows, valid for one set of input versions.
pub(super) struct Ordered<R> {
    pub versions: Versions,
    pub rows: Arc<[Arc<R>]>,
}

impl<R> Clone for Ordered<R> {
    fn clone(&self) -> Self {
        Self {
            versions: self.versions,
            rows: Arc::clone(&self.rows),
        }
    }
}

/// Copy of the inputs the ordered sequence depends on.
///
/// Taken under the store lock and run after it is released, so filter and
/// sort callbacks may read from the store.
pub(super) struct Derivation<R> {
    versions: Versions,
    data: Vec<Arc<R>>,
    filters: FilterSet<R>,
    sort: SortSpec<R>,
}

impl<R: Row> Derivation<R> {
    pub fn run(self) -> Result<Ordered<R>, TableError> {
        let mut rows = self.filters.apply(&self.data)?;
        self.sort.sort(&mut rows)?;
        debug!(
            "derived {} of {} row(s) with {} filter(s), sort {:?}",
            rows.len(),
            self.data.len(),
            self.filters.len(),
            self.sort.order
        );
        Ok(Ordered {
            versions: self.versions,
            rows: rows.into(),
        })
    }
}

pub(super) struct StoreInner<R> {
    pub inputs: Inputs<R>,
    pub versions: Versions,
    pub selection: Selection<R>,
    pub state: Arc<TableState<R>>,
    pub batch_depth: usize,
    pub pending: bool,
    memo: Option<Ordered<R>>,
    reconciled_data: u64,
}

impl<R> StoreInner<R> {
    pub fn new() -> Self {
        Self {
            inputs: Inputs::default(),
            versions: Versions::default(),
            selection: Selection::new(),
            state: Arc::new(TableState::empty()),
            batch_depth: 0,
            pending: false,
            memo: None,
            reconciled_data: 0,
        }
    }

    /// Filtered and sorted rows from the last successful derivation, if it
    /// is still current.
    pub fn cached_ordered(&self) -> Option<Ordered<R>> {
        self.memo
            .as_ref()
            .filter(|memo| memo.versions == self.versions)
            .cloned()
    }

    /// Snapshot of the inputs for a fresh derivation.
    pub fn derivation(&self) -> Derivation<R> {
        Derivation {
            versions: self.versions,
            data: self.inputs.data.clone(),
            filters: self.inputs.filters.clone(),
            sort: self.inputs.sort.clone(),
        }
    }

    /// Stores `ordered` unless the inputs moved on while it was derived.
    pub fn remember(&mut self, ordered: &Ordered<R>) -> bool {
        if ordered.versions != self.versions {
            return false;
        }
        self.memo = Some(ordered.clone());
        true
    }

    /// Runs paginate, reconcile and assemble over `ordered` and returns the
    /// events to emit.
    ///
    /// `ordered` must match the current versions.
    pub fn recompute(&mut self, ordered: &[Arc<R>]) -> Vec<TableEvent<R>> {
        let pagination = self.inputs.pagination;
        let page = paginate(ordered, pagination);

        if page.clamped {
            debug!(
                "clamped page {:?} to {} of {}",
                pagination.current_page, page.current_page, page.total_pages
            );
            self.inputs.pagination.current_page = Some(page.current_page);
        }

        if self.reconciled_data != self.versions.data {
            let dropped = self.selection.retain_present(&self.inputs.data);
            if !dropped.is_empty() {
                debug!("dropped {} stale selection(s)", dropped.len());
            }
            self.reconciled_data = self.versions.data;
        }

        let next = Arc::new(TableState {
            data: self.inputs.data.clone(),
            rows: page.rows,
            selected_rows: self.selection.selected().to_vec(),
            total_items: page.total_items,
            total_pages: page.total_pages,
            current_page: page.current_page,
        });

        let events = diff(&self.state, &next);
        if !events.is_empty() {
            self.state = next;
        }
        self.pending = false;
        debug!(
            "recomputed: page {}/{}, {} item(s), {} event(s)",
            self.state.current_page,
            self.state.total_pages,
            self.state.total_items,
            events.len()
        );
        events
    }
}
