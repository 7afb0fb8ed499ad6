//! Persisted login toggle and its view.

use crate::middleware::{Persist, PersistOptions, StateStorage};
use crate::store::{Listener, StateStore, Store, Subscription};
use crate::view::{Component, Node};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage key the auth state is persisted under.
pub const AUTH_STORAGE_KEY: &str = "auth-storage";

/// Name used by the login control.
pub const GUEST_NAME: &str = "Guest";

pub const LOGIN_CONTROL: &str = "login";
pub const LOGOUT_CONTROL: &str = "logout";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthState {
    pub user: Option<User>,
}

/// Handle to the auth state. Clones share the same store.
#[derive(Clone)]
pub struct AuthStore {
    store: Arc<dyn StateStore<AuthState>>,
}

impl AuthStore {
    /// Take ownership of `store`, bare or wrapped in middleware.
    pub fn new<S>(store: S) -> Self
    where
        S: StateStore<AuthState> + 'static,
    {
        Self {
            store: Arc::new(store),
        }
    }

    /// A logged-out store wrapped in [`Persist`], restored from `storage`.
    pub fn persisted<B>(storage: B, options: PersistOptions<AuthState>) -> Self
    where
        B: StateStorage + 'static,
    {
        Self::new(Persist::new(
            Store::new(AuthState::default()),
            storage,
            options,
        ))
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.store.get_state()
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<User> {
        self.state().user
    }

    /// Log in as `name`. No validation; replaces any current user.
    pub fn login(&self, name: impl Into<String>) {
        let user = User { name: name.into() };
        self.store.set_state("login", &|_: &AuthState| AuthState {
            user: Some(user.clone()),
        });
    }

    /// Clear the user. A no-op when nobody is logged in.
    pub fn logout(&self) {
        self.store
            .set_state("logout", &|_: &AuthState| AuthState { user: None });
    }

    /// Call `listener` after every change.
    pub fn subscribe(&self, listener: Listener<AuthState>) -> Subscription {
        self.store.subscribe(listener)
    }
}

/// Welcome message and logout when logged in, a guest login otherwise.
pub struct AuthView {
    store: AuthStore,
}

impl AuthView {
    pub fn new(store: AuthStore) -> Self {
        Self { store }
    }
}

impl Component for AuthView {
    type State = AuthState;

    fn state(&self) -> AuthState {
        self.store.state()
    }

    fn subscribe(&self, listener: Listener<AuthState>) -> Subscription {
        self.store.subscribe(listener)
    }

    fn render(state: &AuthState) -> Node {
        let mut children = vec![Node::heading(1, "Middleware example")];
        match &state.user {
            Some(user) => {
                children.push(Node::heading(2, format!("Welcome, {}", user.name)));
                children.push(Node::button(LOGOUT_CONTROL, "Logout"));
            }
            None => children.push(Node::button(LOGIN_CONTROL, "Login as Guest")),
        }
        Node::Fragment(children)
    }

    fn on_click(&self, id: &str) {
        match id {
            LOGIN_CONTROL => self.store.login(GUEST_NAME),
            LOGOUT_CONTROL => self.store.logout(),
            _ => {}
        }
    }
}
