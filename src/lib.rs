//! # Tinstore
//!
//! Small observable state stores with decorator-style middleware.
//!
//! ## Stores
//!
//! - `Store<T>` - Thread-safe state container with explicit subscriptions
//! - `StateStore<T>` - The interface shared by stores and middleware
//!
//! ## Middleware
//!
//! Decorators that implement `StateStore<T>` around another store:
//! - `Devtools` - Reports every transition to an observation channel
//! - `Persist` - Writes every state to key-value storage and restores it
//!
//! ## Apps
//!
//! Two demo applications built from the pieces above, each one store
//! handle plus one view: a counter observed by devtools and a login
//! toggle persisted under `"auth-storage"`.

pub mod apps;
pub mod config;
pub mod logging;
pub mod middleware;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use store::{Listener, StateStore, Store, Subscription};
pub use view::{mount, Component, Mounted, Node};
