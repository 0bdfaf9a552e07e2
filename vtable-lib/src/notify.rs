//! Change notifications for derived table state.

use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use log::trace;
use tokio::sync::watch;

use crate::state::TableState;

/// Event emitted after a recompute.
pub enum TableEvent<R> {
    /// The snapshot differs from the previous one.
    StateChanged(Arc<TableState<R>>),
    /// The page count changed.
    TotalPagesChanged(usize),
    /// The filtered row count changed.
    TotalItemsChanged(usize),
}

impl<R> TableEvent<R> {
    /// Returns the event name, as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            TableEvent::StateChanged(_) => "stateChanged",
            TableEvent::TotalPagesChanged(_) => "totalPagesChanged",
            TableEvent::TotalItemsChanged(_) => "totalItemsChanged",
        }
    }
}

impl<R> Clone for TableEvent<R> {
    fn clone(&self) -> Self {
        match self {
            TableEvent::StateChanged(state) => TableEvent::StateChanged(Arc::clone(state)),
            TableEvent::TotalPagesChanged(n) => TableEvent::TotalPagesChanged(*n),
            TableEvent::TotalItemsChanged(n) => TableEvent::TotalItemsChanged(*n),
        }
    }
}

impl<R> fmt::Debug for TableEvent<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableEvent::StateChanged(state) => f
                .debug_struct("StateChanged")
                .field("total_items", &state.total_items)
                .field("total_pages", &state.total_pages)
                .field("current_page", &state.current_page)
                .finish_non_exhaustive(),
            TableEvent::TotalPagesChanged(n) => f.debug_tuple("TotalPagesChanged").field(n).finish(),
            TableEvent::TotalItemsChanged(n) => f.debug_tuple("TotalItemsChanged").field(n).finish(),
        }
    }
}

/// Event callback.
pub type EventListener<R> = dyn Fn(&TableEvent<R>) + Send + Sync;

/// Handle returned by [`Store::subscribe`](crate::Store::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

impl SubscriptionId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

/// Computes the events for a transition from `previous` to `next`.
///
/// `StateChanged` fires only when the snapshots differ; each count event
/// fires only when that count differs.
pub fn diff<R>(previous: &TableState<R>, next: &Arc<TableState<R>>) -> Vec<TableEvent<R>> {
    let mut events = Vec::new();
    if **next != *previous {
        events.push(TableEvent::StateChanged(Arc::clone(next)));
    }
    if next.total_pages != previous.total_pages {
        events.push(TableEvent::TotalPagesChanged(next.total_pages));
    }
    if next.total_items != previous.total_items {
        events.push(TableEvent::TotalItemsChanged(next.total_items));
    }
    events
}

/// Listener registry plus a watch channel holding the latest snapshot.
pub struct Notifier<R> {
    listeners: RwLock<Vec<(SubscriptionId, Arc<EventListener<R>>)>>,
    latest: watch::Sender<Arc<TableState<R>>>,
}

impl<R> Notifier<R> {
    /// Creates a notifier whose watch channel starts at `initial`.
    pub fn new(initial: Arc<TableState<R>>) -> Self {
        let (latest, _) = watch::channel(initial);
        Self {
            listeners: RwLock::new(Vec::new()),
            latest,
        }
    }

    /// Register an event listener.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&TableEvent<R>) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove an event listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Receiver that always holds the latest published snapshot.
    pub fn watch(&self) -> watch::Receiver<Arc<TableState<R>>> {
        self.latest.subscribe()
    }

    /// Deliver events to every listener.
    ///
    /// Must be called without holding the store lock so listeners can read
    /// from the store.
    pub fn emit(&self, events: &[TableEvent<R>]) {
        if events.is_empty() {
            return;
        }
        for event in events {
            if let TableEvent::StateChanged(state) = event {
                self.latest.send_replace(Arc::clone(state));
            }
        }
        let listeners: Vec<Arc<EventListener<R>>> = self
            .listeners
            .read()
            .map(|guard| guard.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        for event in events {
            trace!("emit {} to {} listener(s)", event.name(), listeners.len());
            for listener in &listeners {
                listener(event);
            }
        }
    }
}
