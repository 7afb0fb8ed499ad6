//! State containers.
//!
//! [`Store`] is the base container. [`StateStore`] is the interface it
//! shares with the middleware decorators in [`crate::middleware`], so a
//! store can be wrapped without its callers noticing.

mod state_store;
mod store;

pub use state_store::{Listener, StateStore, Subscription};
pub use store::Store;
