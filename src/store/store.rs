use super::state_store::{Listener, StateStore, Subscription};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct Subscribers<T> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, Arc<dyn Fn(&T) + Send + Sync>)>>,
}

/// A thread-safe store holding one state record and its subscribers.
///
/// Every write replaces the state and then notifies subscribers with the
/// new value, in the order they subscribed. No lock is held while an
/// update closure or a subscriber runs, so both are free to read the store
/// or call back into it.
///
/// # Examples
///
/// ```
/// use tinstore::Store;
///
/// let store = Store::new(0u32);
/// let _sub = store.subscribe(|n| println!("now {n}"));
///
/// store.update(|n| *n += 1);
/// assert_eq!(store.get(), 1);
/// ```
pub struct Store<T> {
    state: Arc<RwLock<T>>,
    subscribers: Arc<Subscribers<T>>,
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    /// Create a new store with the given initial state.
    pub fn new(initial: T) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
            subscribers: Arc::new(Subscribers {
                next_id: AtomicU64::new(0),
                entries: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Get a clone of the current state.
    pub fn get(&self) -> T {
        self.state.read().clone()
    }

    /// Update the state in place.
    ///
    /// `f` edits a snapshot; the result replaces the state once `f` returns.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Set a new state value.
    pub fn set(&self, new_state: T) {
        let snapshot = new_state.clone();
        *self.state.write() = new_state;
        self.notify(&snapshot);
    }

    /// Subscribe to state changes.
    ///
    /// The callback runs after every write with the new state. It stays
    /// registered until the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.subscribers.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.entries.write().push((id, Arc::new(callback)));

        let subscribers = Arc::downgrade(&self.subscribers);
        Subscription::new(move || {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers.entries.write().retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.entries.read().len()
    }

    /// Read state without cloning it.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let state = self.state.read();
        f(&*state)
    }

    fn notify(&self, state: &T) {
        // Snapshot the list so subscribers can (un)subscribe while we iterate.
        let subscribers: Vec<_> = self
            .subscribers
            .entries
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for subscriber in subscribers {
            subscriber(state);
        }
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> StateStore<T> for Store<T> {
    fn get_state(&self) -> T {
        self.get()
    }

    fn set_state(&self, action: &str, update: &dyn Fn(&T) -> T) {
        tracing::trace!(action, "set_state");
        let next = update(&self.get());
        self.set(next);
    }

    fn subscribe(&self, listener: Listener<T>) -> Subscription {
        Store::subscribe(self, listener)
    }
}
