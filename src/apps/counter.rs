//! Counter store reported to devtools, and its view.

use crate::middleware::{Devtools, DevtoolsConnection, DevtoolsOptions};
use crate::store::{Listener, StateStore, Store, Subscription};
use crate::view::{Component, Node};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const INCREASE_CONTROL: &str = "increase";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounterState {
    pub count: u64,
}

/// Handle to the counter state. Clones share the same store.
#[derive(Clone)]
pub struct CounterStore {
    store: Arc<dyn StateStore<CounterState>>,
}

impl CounterStore {
    /// Take ownership of `store`, bare or wrapped in middleware.
    pub fn new<S>(store: S) -> Self
    where
        S: StateStore<CounterState> + 'static,
    {
        Self {
            store: Arc::new(store),
        }
    }

    /// A fresh counter wrapped in [`Devtools`].
    pub fn with_devtools<C>(connection: C, options: DevtoolsOptions) -> Self
    where
        C: DevtoolsConnection + 'static,
    {
        Self::new(Devtools::new(
            Store::new(CounterState::default()),
            options,
            connection,
        ))
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CounterState {
        self.store.get_state()
    }

    /// Current count.
    pub fn count(&self) -> u64 {
        self.state().count
    }

    /// Add one to the count.
    pub fn increase(&self) {
        self.store.set_state("increase", &|state: &CounterState| CounterState {
            count: state.count + 1,
        });
    }

    /// Call `listener` after every change.
    pub fn subscribe(&self, listener: Listener<CounterState>) -> Subscription {
        self.store.subscribe(listener)
    }
}

/// Shows the count and an "Increase" button.
pub struct CounterView {
    store: CounterStore,
}

impl CounterView {
    pub fn new(store: CounterStore) -> Self {
        Self { store }
    }
}

impl Component for CounterView {
    type State = CounterState;

    fn state(&self) -> CounterState {
        self.store.state()
    }

    fn subscribe(&self, listener: Listener<CounterState>) -> Subscription {
        self.store.subscribe(listener)
    }

    fn render(state: &CounterState) -> Node {
        Node::Fragment(vec![
            Node::heading(2, format!("Count: {}", state.count)),
            Node::button(INCREASE_CONTROL, "Increase"),
        ])
    }

    fn on_click(&self, id: &str) {
        if id == INCREASE_CONTROL {
            self.store.increase();
        }
    }
}
