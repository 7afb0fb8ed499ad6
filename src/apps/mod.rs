//! The two demo applications: a devtools-observed counter and a persisted
//! login toggle. Each is one store handle plus one view.

pub mod auth;
pub mod counter;

pub use auth::{AuthState, AuthStore, AuthView, User, AUTH_STORAGE_KEY, GUEST_NAME};
pub use counter::{CounterState, CounterStore, CounterView};
