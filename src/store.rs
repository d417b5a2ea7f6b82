//! Observable state container, one per synchronized domain.
//!
//! DESIGN
//! ======
//! A `Store` holds one snapshot behind a mutex plus a plain observer list.
//! `set`/`update` commit the new snapshot first and then notify every
//! listener synchronously, on the caller's task, with the committed value.
//! Listeners run outside the snapshot lock, so they may read the store (or
//! even write it) without deadlocking.
//!
//! A mutation is one locked operation: two concurrent `update` calls never
//! lose each other's edits, and a read after `set` returns always reflects it.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct StoreInner<T> {
    name: &'static str,
    snapshot: Mutex<T>,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_listener_id: AtomicU64,
}

/// Shared handle to one domain's state. Cloning shares the same state.
pub struct Store<T> {
    inner: Arc<StoreInner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Store<T> {
    #[must_use]
    pub fn new(name: &'static str, initial: T) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                name,
                snapshot: Mutex::new(initial),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Clone of the current snapshot.
    #[must_use]
    pub fn get(&self) -> T {
        self.lock_snapshot().clone()
    }

    /// Read the snapshot in place without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock_snapshot())
    }

    /// Replace the snapshot and notify listeners.
    pub fn set(&self, next: T) {
        let committed = {
            let mut snapshot = self.lock_snapshot();
            *snapshot = next;
            snapshot.clone()
        };
        self.notify(&committed);
    }

    /// Patch the snapshot in place and notify listeners.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (out, committed) = {
            let mut snapshot = self.lock_snapshot();
            let out = f(&mut snapshot);
            (out, snapshot.clone())
        };
        self.notify(&committed);
        out
    }

    /// Register a listener called after every committed mutation.
    ///
    /// The listener stays registered until the returned `Subscription` is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.lock_listeners().push((id, Arc::new(listener)));

        let weak: Weak<StoreInner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .listeners
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    fn notify(&self, committed: &T) {
        // PHASE: SNAPSHOT LISTENERS
        // WHY: listeners may subscribe/unsubscribe while being notified.
        let listeners: Vec<Listener<T>> = self
            .lock_listeners()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(committed);
        }
    }

    fn lock_snapshot(&self) -> MutexGuard<'_, T> {
        self.inner
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(u64, Listener<T>)>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration handle returned by [`Store::subscribe`].
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
