//! Observable values owned by the host.
//!
//! A [`Prop`] is the host side of a one-way binding into a
//! [`Store`](crate::Store): the host changes it with [`Prop::set`] or
//! [`Prop::update`], and every subscribed store re-copies the value and
//! re-derives its state before the call returns.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vtable_lib::{Prop, Store};
//! use vtable_lib::model::Record;
//!
//! let page_size = Prop::new(Some(2usize));
//! let store: Store<Record> = Store::new();
//! store.sync_page_size(&page_size).unwrap();
//!
//! page_size.set(Some(5)).unwrap();
//! assert_eq!(store.pagination().page_size, Some(5));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::error::TableError;

/// How a [`Prop`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// The whole value was replaced with [`Prop::set`].
    Replaced,
    /// The value was mutated in place with [`Prop::update`].
    Mutated,
}

/// Callback run after every change, with a snapshot of the new value.
pub type PropListener<T> = dyn Fn(&T, Change) -> Result<(), TableError> + Send + Sync;

/// Handle returned by [`Prop::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__listener_{}", self.0)
    }
}

/// Shared, observable value cell.
///
/// Cloning a `Prop` yields another handle to the same value and the same
/// listeners. Listeners run synchronously on the thread that changed the
/// value, after all locks are released.
pub struct Prop<T> {
    inner: Arc<RwLock<T>>,
    listeners: Arc<RwLock<Vec<(ListenerId, Arc<PropListener<T>>)>>>,
}

impl<T> Prop<T> {
    /// Create a new prop with the given value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run a closure against the current value without cloning it.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        f(&self.read())
    }

    /// Register a change listener.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T, Change) -> Result<(), TableError> + Send + Sync + 'static,
    {
        let id = ListenerId::new();
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a change listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .map(|guard| guard.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

impl<T: Clone> Prop<T> {
    /// Get a clone of the current value
    pub fn get(&self) -> T {
        self.read().clone()
    }

    /// Replace the value and notify listeners.
    ///
    /// Returns the first listener failure; every listener still runs.
    pub fn set(&self, value: T) -> Result<(), TableError> {
        let snapshot = {
            let mut guard = self.write();
            *guard = value;
            guard.clone()
        };
        self.notify(&snapshot, Change::Replaced)
    }

    /// Mutate the value in place and notify listeners.
    pub fn update<F>(&self, f: F) -> Result<(), TableError>
    where
        F: FnOnce(&mut T),
    {
        let snapshot = {
            let mut guard = self.write();
            f(&mut guard);
            guard.clone()
        };
        self.notify(&snapshot, Change::Mutated)
    }

    fn notify(&self, value: &T, change: Change) -> Result<(), TableError> {
        let listeners: Vec<Arc<PropListener<T>>> = self
            .listeners
            .read()
            .map(|guard| guard.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        let mut first_error = None;
        for listener in listeners {
            if let Err(e) = listener(value, change)
                && first_error.is_none()
            {
                first_error = Some(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<T> Clone for Prop<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T: Default> Default for Prop<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Prop<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prop")
            .field("value", &*self.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_set_and_update_report_change_kind() {
        let prop = Prop::new(vec![1]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        prop.subscribe(move |value: &Vec<i32>, change| {
            sink.lock().unwrap().push((value.len(), change));
            Ok(())
        });

        prop.set(vec![1, 2]).unwrap();
        prop.update(|v| v.push(3)).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(2, Change::Replaced), (3, Change::Mutated)]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let prop = Prop::new(0);
        let id = prop.subscribe(|_, _| Ok(()));
        assert_eq!(prop.listener_count(), 1);
        assert!(prop.unsubscribe(id));
        assert!(!prop.unsubscribe(id));
        assert_eq!(prop.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_read_prop() {
        let prop = Prop::new(1);
        let handle = prop.clone();
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        prop.subscribe(move |_, _| {
            *sink.lock().unwrap() = handle.get();
            Ok(())
        });

        prop.set(7).unwrap();
        assert_eq!(*seen.lock().unwrap(), 7);
    }
}
