//! The table store.
//!
//! A [`Store`] owns the inputs of one table (data, filters, sort, pagination,
//! selection) and the [`TableState`] derived from them. Every mutation, be it
//! a direct setter call, a synced [`Prop`] change or a selection call,
//! re-runs the pipeline synchronously:
//!
//! filter → sort → paginate → reconcile selection → notify
//!
//! Several mutations can be coalesced into a single pass with
//! [`Store::batch`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vtable_lib::{SelectionMode, Store};
//! use vtable_lib::model::Record;
//! use vtable_lib::query::{Filter, FilterSet, SortSpec};
//!
//! let data: Vec<Arc<Record>> = ["Bob", "Ann", "Anna"]
//!     .into_iter()
//!     .map(|name| Arc::new(Record::new().set("name", name)))
//!     .collect();
//!
//! let store = Store::with_data(data);
//! store.batch(|s| {
//!     s.set_filters(FilterSet::new().with("search", Filter::basic("an", ["name"])))?;
//!     s.set_sort(SortSpec::asc("name"))?;
//!     s.set_page_size(Some(1))
//! }).unwrap();
//!
//! let state = store.state();
//! assert_eq!(state.total_items, 2);
//! assert_eq!(state.total_pages, 2);
//! assert_eq!(state.rows[0].get_string("name").unwrap(), Some("Ann"));
//! ```

mod derive;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::sync::Weak;

use log::trace;
use tokio::sync::watch;

use crate::config::TableConfig;
use crate::config::TableOptions;
use crate::error::TableError;
use crate::model::Row;
use crate::notify::Notifier;
use crate::notify::SubscriptionId;
use crate::notify::TableEvent;
use crate::query::FilterSet;
use crate::query::Pagination;
use crate::query::SortOrder;
use crate::query::SortSpec;
use crate::selection::SelectionMode;
use crate::selection::contains_row;
use crate::state::TableState;
use crate::sync::Change;
use crate::sync::ListenerId;
use crate::sync::Prop;

use derive::Ordered;
use derive::StoreInner;

/// What [`Store::reveal_item`] looks for.
pub enum RevealTarget<R> {
    /// A specific row, matched by identity.
    Row(Arc<R>),
    /// The first row satisfying a predicate.
    Matching(Box<dyn Fn(&R) -> bool + Send + Sync>),
}

impl<R> RevealTarget<R> {
    /// Targets the first row satisfying `predicate`.
    pub fn matching<F>(predicate: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        RevealTarget::Matching(Box::new(predicate))
    }

    fn position(&self, rows: &[Arc<R>]) -> Option<usize> {
        match self {
            RevealTarget::Row(row) => rows.iter().position(|r| Arc::ptr_eq(r, row)),
            RevealTarget::Matching(predicate) => rows.iter().position(|r| predicate(&**r)),
        }
    }
}

impl<R> From<Arc<R>> for RevealTarget<R> {
    fn from(row: Arc<R>) -> Self {
        RevealTarget::Row(row)
    }
}

struct Shared<R> {
    inner: RwLock<StoreInner<R>>,
    notifier: Notifier<R>,
}

/// Reactive table state engine.
///
/// `Store` is a cheap, cloneable handle; clones share the same state. Prop
/// bindings only hold a weak reference, so dropping every handle detaches
/// the store from its sources.
///
/// Filter predicates, sort callbacks and reveal predicates run without the
/// store lock held and may read from the store.
pub struct Store<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<R> Store<R> {
    fn read(&self) -> RwLockReadGuard<'_, StoreInner<R>> {
        self.shared
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner<R>> {
        self.shared
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn downgrade(&self) -> Weak<Shared<R>> {
        Arc::downgrade(&self.shared)
    }

    fn upgrade(weak: &Weak<Shared<R>>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    // -------------------------------------------------------------------------
    // Reading
    // -------------------------------------------------------------------------

    /// Latest published snapshot.
    pub fn state(&self) -> Arc<TableState<R>> {
        Arc::clone(&self.read().state)
    }

    /// Current pagination, including any clamping or reveal correction.
    pub fn pagination(&self) -> Pagination {
        self.read().inputs.pagination
    }

    /// Current selection mode.
    pub fn selection_mode(&self) -> SelectionMode {
        self.read().inputs.selection_mode
    }

    /// Presentation settings.
    pub fn options(&self) -> TableOptions {
        self.read().inputs.options.clone()
    }

    /// Active sort specification.
    pub fn sort(&self) -> SortSpec<R> {
        self.read().inputs.sort.clone()
    }

    /// Active filters.
    pub fn filters(&self) -> FilterSet<R> {
        self.read().inputs.filters.clone()
    }

    /// Order a header with the given sort id should display.
    pub fn sort_order_of(&self, sort_id: &str) -> SortOrder {
        let inner = self.read();
        match inner.inputs.sort.id.as_deref() {
            Some(id) if id == sort_id => inner.inputs.sort.order,
            _ => SortOrder::None,
        }
    }

    /// Returns `true` if `row` is selected.
    pub fn is_selected(&self, row: &Arc<R>) -> bool {
        self.read().selection.contains(row)
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    /// Register an event listener.
    ///
    /// Listeners run after the store lock is released, so they may read from
    /// the store.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&TableEvent<R>) + Send + Sync + 'static,
    {
        self.shared.notifier.subscribe(listener)
    }

    /// Remove an event listener.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.notifier.unsubscribe(id)
    }

    /// Receiver that always holds the latest snapshot.
    pub fn watch(&self) -> watch::Receiver<Arc<TableState<R>>> {
        self.shared.notifier.watch()
    }
}

impl<R: Row + Send + Sync + 'static> Store<R> {
    /// Creates an empty store with default inputs.
    pub fn new() -> Self {
        let inner = StoreInner::new();
        let notifier = Notifier::new(Arc::clone(&inner.state));
        Self {
            shared: Arc::new(Shared {
                inner: RwLock::new(inner),
                notifier,
            }),
        }
    }

    /// Creates a store over `data` with default inputs.
    pub fn with_data(data: Vec<Arc<R>>) -> Self {
        let store = Self::new();
        store.set_data(data).ok();
        store
    }

    /// Creates a store from a serialized configuration, deriving the first
    /// snapshot in a single pass.
    pub fn from_config(config: TableConfig, data: Vec<Arc<R>>) -> Result<Self, TableError> {
        let store = Self::new();
        let pagination = config.pagination();
        store.batch(|s| {
            s.set_selection_mode(config.selection_mode)?;
            s.set_options(config.options);
            s.set_filters(FilterSet::from(config.filters))?;
            if let Some(sort) = config.sort {
                s.set_sort(SortSpec::by(sort.key, sort.order))?;
            }
            s.set_pagination(pagination)?;
            s.set_data(data)
        })?;
        Ok(store)
    }

    /// Applies `f` to the inner state and, unless batching, recomputes and
    /// notifies. `f` returns whether anything changed.
    fn mutate<F>(&self, f: F) -> Result<(), TableError>
    where
        F: FnOnce(&mut StoreInner<R>) -> Result<bool, TableError>,
    {
        {
            let mut inner = self.write();
            let changed = f(&mut inner)?;
            inner.pending |= changed;
            if inner.batch_depth > 0 || !inner.pending {
                return Ok(());
            }
        }
        self.flush()
    }

    /// Recomputes a pending change and notifies.
    fn flush(&self) -> Result<(), TableError> {
        loop {
            let ordered = self.ordered()?;
            let events = {
                let mut inner = self.write();
                if inner.batch_depth > 0 || !inner.pending {
                    return Ok(());
                }
                if ordered.versions != inner.versions {
                    continue;
                }
                inner.recompute(&ordered.rows)
            };
            self.shared.notifier.emit(&events);
            return Ok(());
        }
    }

    /// Filtered and sorted rows for the current inputs.
    ///
    /// Derives from a copy of the inputs with the lock released; if the
    /// inputs changed meanwhile the result is discarded and derived again.
    fn ordered(&self) -> Result<Ordered<R>, TableError> {
        loop {
            let derivation = {
                let inner = self.read();
                if let Some(ordered) = inner.cached_ordered() {
                    trace!("reusing memoized order");
                    return Ok(ordered);
                }
                inner.derivation()
            };
            let ordered = derivation.run()?;
            if self.write().remember(&ordered) {
                return Ok(ordered);
            }
            trace!("inputs changed while deriving, retrying");
        }
    }

    /// Runs `f` with recomputation deferred, then recomputes once.
    ///
    /// Batches nest; only the outermost one recomputes. Changes made before
    /// `f` fails are kept and still derived.
    pub fn batch<T, F>(&self, f: F) -> Result<T, TableError>
    where
        F: FnOnce(&Self) -> Result<T, TableError>,
    {
        struct Depth<'a, R>(&'a Store<R>);

        impl<R> Drop for Depth<'_, R> {
            fn drop(&mut self) {
                let mut inner = self.0.write();
                inner.batch_depth = inner.batch_depth.saturating_sub(1);
            }
        }

        self.write().batch_depth += 1;
        let result = {
            let _depth = Depth(self);
            f(self)
        };
        let flushed = self.mutate(|_| Ok(false));
        let value = result?;
        flushed?;
        Ok(value)
    }

    // -------------------------------------------------------------------------
    // Inputs
    // -------------------------------------------------------------------------

    /// Replaces the source data.
    ///
    /// Handing back the same row allocations in the same order is a no-op.
    pub fn set_data(&self, data: Vec<Arc<R>>) -> Result<(), TableError> {
        self.mutate(|inner| {
            let current = &inner.inputs.data;
            if current.len() == data.len() && current.iter().zip(&data).all(|(a, b)| Arc::ptr_eq(a, b)) {
                return Ok(false);
            }
            inner.inputs.data = data;
            inner.versions.data += 1;
            Ok(true)
        })
    }

    /// Replaces the filter set. Structurally equal sets are a no-op.
    pub fn set_filters(&self, filters: FilterSet<R>) -> Result<(), TableError> {
        self.mutate(|inner| {
            if inner.inputs.filters == filters {
                return Ok(false);
            }
            inner.inputs.filters = filters;
            inner.versions.filters += 1;
            Ok(true)
        })
    }

    /// Edits the filter set in place.
    pub fn update_filters<F>(&self, f: F) -> Result<(), TableError>
    where
        F: FnOnce(&mut FilterSet<R>),
    {
        let mut filters = self.filters();
        f(&mut filters);
        self.set_filters(filters)
    }

    /// Replaces the sort specification.
    pub fn set_sort(&self, sort: SortSpec<R>) -> Result<(), TableError> {
        self.mutate(|inner| {
            if inner.inputs.sort == sort {
                return Ok(false);
            }
            inner.inputs.sort = sort;
            inner.versions.sort += 1;
            Ok(true)
        })
    }

    /// Stops sorting; rows fall back to their filtered order.
    pub fn clear_sort(&self) -> Result<(), TableError> {
        self.set_sort(SortSpec::none())
    }

    /// Header-click sorting.
    ///
    /// `header` describes the clicked header (key, comparator and id). If that
    /// header currently sorts ascending it flips to descending, otherwise it
    /// sorts ascending. Returns the new order.
    pub fn toggle_sort(&self, header: SortSpec<R>) -> Result<SortOrder, TableError> {
        let current = match header.id.as_deref() {
            Some(id) => self.sort_order_of(id),
            None => SortOrder::None,
        };
        let order = current.toggled();
        self.set_sort(SortSpec { order, ..header })?;
        Ok(order)
    }

    /// Sets the requested page.
    pub fn set_current_page(&self, current_page: Option<usize>) -> Result<(), TableError> {
        self.mutate(|inner| {
            if inner.inputs.pagination.current_page == current_page {
                return Ok(false);
            }
            inner.inputs.pagination.current_page = current_page;
            Ok(true)
        })
    }

    /// Sets the page size. `None` or zero disables pagination.
    pub fn set_page_size(&self, page_size: Option<usize>) -> Result<(), TableError> {
        self.mutate(|inner| {
            if inner.inputs.pagination.page_size == page_size {
                return Ok(false);
            }
            inner.inputs.pagination.page_size = page_size;
            Ok(true)
        })
    }

    /// Sets page and page size together.
    pub fn set_pagination(&self, pagination: Pagination) -> Result<(), TableError> {
        self.mutate(|inner| {
            if inner.inputs.pagination == pagination {
                return Ok(false);
            }
            inner.inputs.pagination = pagination;
            Ok(true)
        })
    }

    /// Sets the selection mode.
    ///
    /// Switching to single mode keeps only the most recently selected row.
    pub fn set_selection_mode(&self, mode: SelectionMode) -> Result<(), TableError> {
        self.mutate(|inner| {
            if inner.inputs.selection_mode == mode {
                return Ok(false);
            }
            inner.inputs.selection_mode = mode;
            Ok(inner.selection.enforce_mode(mode))
        })
    }

    /// Sets the presentation settings. Never triggers a recompute.
    pub fn set_options(&self, options: TableOptions) {
        self.write().inputs.options = options;
    }

    // -------------------------------------------------------------------------
    // Prop bindings
    // -------------------------------------------------------------------------

    /// Binds `source` into the store by reference.
    ///
    /// The current value is applied immediately with `apply`; afterwards
    /// every [`Prop::set`] re-applies it. In-place [`Prop::update`]s are not
    /// observed; use [`Store::sync_prop_deep`] for values edited in place.
    pub fn sync_prop<T, F>(&self, source: &Prop<T>, apply: F) -> Result<ListenerId, TableError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Store<R>, T) -> Result<(), TableError> + Send + Sync + 'static,
    {
        apply(self, source.get())?;
        let weak = self.downgrade();
        Ok(source.subscribe(move |value, change| {
            if change == Change::Mutated {
                return Ok(());
            }
            match Self::upgrade(&weak) {
                Some(store) => {
                    trace!("sync: value replaced");
                    apply(&store, value.clone())
                }
                None => Ok(()),
            }
        }))
    }

    /// Binds `source` into the store structurally.
    ///
    /// Both replacements and in-place edits are observed; a change is applied
    /// only when the new value differs from the last applied one.
    pub fn sync_prop_deep<T, F>(&self, source: &Prop<T>, apply: F) -> Result<ListenerId, TableError>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&Store<R>, T) -> Result<(), TableError> + Send + Sync + 'static,
    {
        let initial = source.get();
        apply(self, initial.clone())?;
        let last = Mutex::new(initial);
        let weak = self.downgrade();
        Ok(source.subscribe(move |value, change| {
            let Some(store) = Self::upgrade(&weak) else {
                return Ok(());
            };
            {
                let mut last = last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                if *last == *value {
                    trace!("sync: {:?} without structural change", change);
                    return Ok(());
                }
                *last = value.clone();
            }
            trace!("sync: value {:?} with structural change", change);
            apply(&store, value.clone())
        }))
    }

    /// Binds the source data.
    pub fn sync_data(&self, source: &Prop<Vec<Arc<R>>>) -> Result<ListenerId, TableError> {
        self.sync_prop(source, |store, data| store.set_data(data))
    }

    /// Binds the filter set, tracking in-place edits.
    pub fn sync_filters(&self, source: &Prop<FilterSet<R>>) -> Result<ListenerId, TableError> {
        self.sync_prop_deep(source, |store, filters| store.set_filters(filters))
    }

    /// Binds the requested page.
    pub fn sync_current_page(&self, source: &Prop<Option<usize>>) -> Result<ListenerId, TableError> {
        self.sync_prop(source, |store, page| store.set_current_page(page))
    }

    /// Binds the page size.
    pub fn sync_page_size(&self, source: &Prop<Option<usize>>) -> Result<ListenerId, TableError> {
        self.sync_prop(source, |store, size| store.set_page_size(size))
    }

    /// Binds the selection mode.
    pub fn sync_selection_mode(&self, source: &Prop<SelectionMode>) -> Result<ListenerId, TableError> {
        self.sync_prop(source, |store, mode| store.set_selection_mode(mode))
    }

    /// Binds the presentation settings.
    pub fn sync_options(&self, source: &Prop<TableOptions>) -> Result<ListenerId, TableError> {
        self.sync_prop(source, |store, options| {
            store.set_options(options);
            Ok(())
        })
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Selects a row.
    ///
    /// In single mode the row replaces the selection. Rows that are not part
    /// of the current data are ignored.
    pub fn select_row(&self, row: &Arc<R>) -> Result<(), TableError> {
        self.mutate(|inner| {
            if !contains_row(&inner.inputs.data, row) {
                return Ok(false);
            }
            let mode = inner.inputs.selection_mode;
            Ok(inner.selection.select(row, mode))
        })
    }

    /// Selects rows one by one, in order, with [`Store::select_row`] semantics.
    pub fn select_rows(&self, rows: &[Arc<R>]) -> Result<(), TableError> {
        self.mutate(|inner| {
            let present: HashSet<*const R> = inner.inputs.data.iter().map(Arc::as_ptr).collect();
            let mode = inner.inputs.selection_mode;
            let mut changed = false;
            for row in rows {
                if present.contains(&Arc::as_ptr(row)) {
                    changed |= inner.selection.select(row, mode);
                }
            }
            Ok(changed)
        })
    }

    /// Deselects a row. No-op if it is not selected.
    pub fn deselect_row(&self, row: &Arc<R>) -> Result<(), TableError> {
        self.mutate(|inner| Ok(inner.selection.deselect(row)))
    }

    /// Deselects rows one by one.
    pub fn deselect_rows(&self, rows: &[Arc<R>]) -> Result<(), TableError> {
        self.mutate(|inner| {
            let mut changed = false;
            for row in rows {
                changed |= inner.selection.deselect(row);
            }
            Ok(changed)
        })
    }

    /// Selects every row that passes the filters, on every page, in display
    /// order. Ignored in single mode.
    pub fn select_all(&self) -> Result<(), TableError> {
        if self.selection_mode() != SelectionMode::Multiple {
            return Ok(());
        }
        let ordered = self.ordered()?;
        self.mutate(|inner| {
            let mode = inner.inputs.selection_mode;
            if mode != SelectionMode::Multiple {
                return Ok(false);
            }
            if ordered.versions.data == inner.versions.data {
                return Ok(inner.selection.select_all(&ordered.rows, mode));
            }
            // Data was replaced after deriving; skip rows that left it.
            let present: HashSet<*const R> = inner.inputs.data.iter().map(Arc::as_ptr).collect();
            let rows: Vec<Arc<R>> = ordered
                .rows
                .iter()
                .filter(|row| present.contains(&Arc::as_ptr(*row)))
                .cloned()
                .collect();
            Ok(inner.selection.select_all(&rows, mode))
        })
    }

    /// Clears the selection. Allowed in every mode.
    pub fn deselect_all(&self) -> Result<(), TableError> {
        self.mutate(|inner| Ok(!inner.selection.clear().is_empty()))
    }

    /// Returns `true` if at least one row passes the filters and every such
    /// row is selected.
    ///
    /// Derives the filtered rows if they are stale, so it also holds inside a
    /// [`Store::batch`] that changed data, filters or sort.
    pub fn all_rows_selected(&self) -> Result<bool, TableError> {
        let ordered = self.ordered()?;
        let inner = self.read();
        if ordered.rows.is_empty() || inner.selection.len() < ordered.rows.len() {
            return Ok(false);
        }
        let selected: HashSet<*const R> = inner.selection.selected().iter().map(Arc::as_ptr).collect();
        Ok(ordered.rows.iter().all(|row| selected.contains(&Arc::as_ptr(row))))
    }

    /// Deselects everything if every filtered row is selected, otherwise
    /// selects all.
    pub fn toggle_all_rows(&self) -> Result<(), TableError> {
        if self.all_rows_selected()? {
            self.deselect_all()
        } else {
            self.select_all()
        }
    }

    // -------------------------------------------------------------------------
    // Reveal
    // -------------------------------------------------------------------------

    /// Moves to the page holding the first filtered, sorted row matching
    /// `target`.
    ///
    /// Returns `Ok(false)` and leaves the page alone when nothing matches.
    /// Unpaginated tables move to page 1. Selection is never touched.
    pub fn reveal_item(&self, target: impl Into<RevealTarget<R>>) -> Result<bool, TableError> {
        let target = target.into();
        let ordered = self.ordered()?;
        let Some(index) = target.position(&ordered.rows) else {
            return Ok(false);
        };
        self.mutate(|inner| {
            let page = inner.inputs.pagination.page_of(index);
            trace!("reveal: index {} is on page {}", index, page);
            if inner.inputs.pagination.current_page == Some(page) {
                return Ok(false);
            }
            inner.inputs.pagination.current_page = Some(page);
            Ok(true)
        })?;
        Ok(true)
    }

    /// Reveals a specific row.
    pub fn reveal_row(&self, row: &Arc<R>) -> Result<bool, TableError> {
        self.reveal_item(RevealTarget::Row(Arc::clone(row)))
    }

    /// Reveals the first row satisfying `predicate`.
    pub fn reveal_where<F>(&self, predicate: F) -> Result<bool, TableError>
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.reveal_item(RevealTarget::matching(predicate))
    }
}

impl<R: Row + Send + Sync + 'static> Default for Store<R> {
    fn default() -> Self {
        Self::new()
    }
}
