//! Store decorators.
//!
//! Each middleware wraps a [`StateStore`](crate::StateStore), implements the
//! same trait, and adds one behavior:
//! - [`Devtools`] reports every transition to a [`DevtoolsConnection`]
//! - [`Persist`] writes every state to a [`StateStorage`] and restores it

mod devtools;
mod persist;
mod storage;

pub use devtools::{
    Devtools, DevtoolsConnection, DevtoolsMessage, DevtoolsOptions, RecordingConnection,
    TracingConnection, INIT_ACTION,
};
pub use persist::{Migrate, Persist, PersistError, PersistOptions, REHYDRATE_ACTION};
pub use storage::{validate_key, FileStorage, MemoryStorage, StateStorage, StorageError};
