use crate::store::{Listener, StateStore, Subscription};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Action name reported when a devtools-wrapped store is created.
pub const INIT_ACTION: &str = "@@INIT";

/// Settings for [`Devtools`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevtoolsOptions {
    /// Instance name shown alongside every message.
    pub name: String,
    /// When false the middleware forwards calls and reports nothing.
    pub enabled: bool,
    /// Reported in place of an empty action name.
    pub anonymous_action_type: String,
}

impl Default for DevtoolsOptions {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            enabled: true,
            anonymous_action_type: "anonymous".to_string(),
        }
    }
}

impl DevtoolsOptions {
    /// Default options under a custom instance name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One observed state transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevtoolsMessage {
    pub store: String,
    pub action: String,
    /// 0 for the init message, then 1, 2, ... per transition.
    pub sequence: u64,
    pub state: serde_json::Value,
}

/// Receiving end of the devtools observation channel.
pub trait DevtoolsConnection: Send + Sync {
    fn send(&self, message: &DevtoolsMessage);
}

/// Reports transitions as `tracing` events on the `tinstore::devtools` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConnection;

impl DevtoolsConnection for TracingConnection {
    fn send(&self, message: &DevtoolsMessage) {
        tracing::info!(
            target: "tinstore::devtools",
            store = %message.store,
            action = %message.action,
            sequence = message.sequence,
            state = %message.state,
            "state transition"
        );
    }
}

/// Keeps every message in memory, in arrival order.
///
/// Clones share the same history.
#[derive(Debug, Default, Clone)]
pub struct RecordingConnection {
    messages: Arc<Mutex<Vec<DevtoolsMessage>>>,
}

impl RecordingConnection {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message received so far.
    pub fn messages(&self) -> Vec<DevtoolsMessage> {
        self.messages.lock().clone()
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<DevtoolsMessage> {
        self.messages.lock().last().cloned()
    }

    /// Action names received so far.
    pub fn actions(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .map(|message| message.action.clone())
            .collect()
    }

    /// Forget the recorded history.
    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl DevtoolsConnection for RecordingConnection {
    fn send(&self, message: &DevtoolsMessage) {
        self.messages.lock().push(message.clone());
    }
}

/// Middleware that reports every state transition to a [`DevtoolsConnection`].
///
/// # Examples
///
/// ```
/// use tinstore::middleware::{Devtools, DevtoolsOptions, RecordingConnection};
/// use tinstore::{StateStore, Store};
///
/// let connection = RecordingConnection::new();
/// let store = Devtools::new(
///     Store::new(1u32),
///     DevtoolsOptions::named("numbers"),
///     connection.clone(),
/// );
///
/// store.set_state("double", &|n: &u32| n * 2);
/// assert_eq!(connection.actions(), vec!["@@INIT", "double"]);
/// ```
pub struct Devtools<S> {
    inner: S,
    options: DevtoolsOptions,
    connection: Arc<dyn DevtoolsConnection>,
    sequence: AtomicU64,
}

impl<S> Devtools<S> {
    /// Wrap `inner`, sending the `@@INIT` message when enabled.
    pub fn new<T, C>(inner: S, options: DevtoolsOptions, connection: C) -> Self
    where
        S: StateStore<T>,
        T: Serialize,
        C: DevtoolsConnection + 'static,
    {
        let devtools = Self {
            inner,
            options,
            connection: Arc::new(connection),
            sequence: AtomicU64::new(0),
        };
        if devtools.options.enabled {
            let state = devtools.inner.get_state();
            devtools.report(INIT_ACTION, 0, &state);
        }
        devtools
    }

    /// Settings this instance was created with.
    pub fn options(&self) -> &DevtoolsOptions {
        &self.options
    }

    fn report<T: Serialize>(&self, action: &str, sequence: u64, state: &T) {
        let state = match serde_json::to_value(state) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(
                    store = %self.options.name,
                    action,
                    error = %err,
                    "devtools could not serialize state; message dropped"
                );
                return;
            }
        };
        self.connection.send(&DevtoolsMessage {
            store: self.options.name.clone(),
            action: action.to_string(),
            sequence,
            state,
        });
    }
}

impl<T, S> StateStore<T> for Devtools<S>
where
    S: StateStore<T>,
    T: Serialize,
{
    fn get_state(&self) -> T {
        self.inner.get_state()
    }

    fn set_state(&self, action: &str, update: &dyn Fn(&T) -> T) {
        self.inner.set_state(action, update);
        if !self.options.enabled {
            return;
        }

        let action = if action.is_empty() {
            self.options.anonymous_action_type.as_str()
        } else {
            action
        };
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let state = self.inner.get_state();
        self.report(action, sequence, &state);
    }

    fn subscribe(&self, listener: Listener<T>) -> Subscription {
        self.inner.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Clone, Serialize)]
    struct Counter {
        count: u32,
    }

    fn bump(prev: &Counter) -> Counter {
        Counter {
            count: prev.count + 1,
        }
    }

    #[test]
    fn init_message_carries_initial_state() {
        let connection = RecordingConnection::new();
        let _store = Devtools::new(
            Store::new(Counter { count: 3 }),
            DevtoolsOptions::named("counter"),
            connection.clone(),
        );

        let init = connection.last().expect("init message");
        assert_eq!(init.action, INIT_ACTION);
        assert_eq!(init.sequence, 0);
        assert_eq!(init.store, "counter");
        assert_eq!(init.state, json!({ "count": 3 }));
    }

    #[test]
    fn every_transition_is_reported_in_order() {
        let connection = RecordingConnection::new();
        let store = Devtools::new(
            Store::new(Counter { count: 0 }),
            DevtoolsOptions::default(),
            connection.clone(),
        );

        store.set_state("bump", &bump);
        store.set_state("bump", &bump);

        let messages = connection.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sequence, 1);
        assert_eq!(messages[2].sequence, 2);
        assert_eq!(messages[2].state, json!({ "count": 2 }));
    }

    #[test]
    fn empty_action_uses_anonymous_type() {
        let connection = RecordingConnection::new();
        let store = Devtools::new(
            Store::new(Counter { count: 0 }),
            DevtoolsOptions::default(),
            connection.clone(),
        );

        store.set_state("", &bump);
        assert_eq!(connection.actions(), vec!["@@INIT", "anonymous"]);
    }

    #[test]
    fn unserializable_state_drops_message_but_applies_change() {
        // JSON object keys must be strings, so tuple keys fail to serialize.
        let connection = RecordingConnection::new();
        let store = Devtools::new(
            Store::new(HashMap::from([((0u8, 0u8), 1u32)])),
            DevtoolsOptions::named("grid"),
            connection.clone(),
        );

        store.set_state("insert", &|prev: &HashMap<(u8, u8), u32>| {
            let mut next = prev.clone();
            next.insert((1, 1), 2);
            next
        });

        let state = store.get_state();
        assert!(connection.messages().is_empty());
        assert_eq!(state.len(), 2);
        assert_eq!(state.get(&(1, 1)), Some(&2));
    }

    #[test]
    fn options_are_kept() {
        let store = Devtools::new(
            Store::new(Counter { count: 0 }),
            DevtoolsOptions::named("counter"),
            RecordingConnection::new(),
        );
        assert_eq!(store.options().name, "counter");
        assert_eq!(store.options().anonymous_action_type, "anonymous");
    }

    #[test]
    fn disabled_devtools_reports_nothing() {
        let connection = RecordingConnection::new();
        let options = DevtoolsOptions {
            enabled: false,
            ..DevtoolsOptions::default()
        };
        let store = Devtools::new(Store::new(Counter { count: 0 }), options, connection.clone());

        store.set_state("bump", &bump);

        assert!(connection.messages().is_empty());
        assert_eq!(store.get_state().count, 1);
    }
}
