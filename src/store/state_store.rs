use std::fmt;
use std::sync::Arc;

/// Callback registered through [`StateStore::subscribe`].
pub type Listener<T> = Box<dyn Fn(&T) + Send + Sync>;

/// The interface shared by [`Store`](super::Store) and every middleware.
///
/// A middleware wraps another `StateStore<T>`, forwards each call to it,
/// and adds exactly one side effect. Because the wrapper implements the
/// same trait, decorators compose in any order.
pub trait StateStore<T>: Send + Sync {
    /// Snapshot of the current state.
    fn get_state(&self) -> T;

    /// Replace the state with `update(&current)` and notify subscribers.
    ///
    /// `action` names the transition for middleware that reports it. It
    /// carries no meaning for the store itself.
    fn set_state(&self, action: &str, update: &dyn Fn(&T) -> T);

    /// Register a listener called with the new state after every change.
    fn subscribe(&self, listener: Listener<T>) -> Subscription;
}

impl<T, S> StateStore<T> for Arc<S>
where
    S: StateStore<T> + ?Sized,
{
    fn get_state(&self) -> T {
        (**self).get_state()
    }

    fn set_state(&self, action: &str, update: &dyn Fn(&T) -> T) {
        (**self).set_state(action, update)
    }

    fn subscribe(&self, listener: Listener<T>) -> Subscription {
        (**self).subscribe(listener)
    }
}

/// RAII guard for a store listener.
///
/// The listener stays registered until this guard is dropped or
/// [`unsubscribe`](Subscription::unsubscribe) is called.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

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

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
