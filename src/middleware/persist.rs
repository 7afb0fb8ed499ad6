use super::storage::{StateStorage, StorageError};
use crate::store::{Listener, StateStore, Subscription};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Action name used when persisted state is restored into the store.
pub const REHYDRATE_ACTION: &str = "@@REHYDRATE";

/// Converts a state persisted under an older version into the current shape.
pub type Migrate<T> = Box<dyn Fn(serde_json::Value, u32) -> Result<T, PersistError> + Send + Sync>;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to serialize state for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse persisted state '{key}': {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("persisted state '{key}' has version {stored}, expected {expected}, and no migration is set")]
    VersionMismatch { key: String, stored: u32, expected: u32 },

    #[error("migration of '{key}' failed: {message}")]
    Migration { key: String, message: String },
}

/// Settings for [`Persist`].
pub struct PersistOptions<T> {
    /// Storage key the state lives under.
    pub name: String,
    pub version: u32,
    pub skip_hydration: bool,
    migrate: Option<Migrate<T>>,
}

impl<T> PersistOptions<T> {
    /// Version 0 options persisting under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 0,
            skip_hydration: false,
            migrate: None,
        }
    }

    /// Version written with every state and expected when restoring.
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Called during rehydration when the stored version differs.
    pub fn migrate<F>(mut self, migrate: F) -> Self
    where
        F: Fn(serde_json::Value, u32) -> Result<T, PersistError> + Send + Sync + 'static,
    {
        self.migrate = Some(Box::new(migrate));
        self
    }

    /// Do not restore on construction; call [`Persist::rehydrate`] later.
    pub fn skip_hydration(mut self) -> Self {
        self.skip_hydration = true;
        self
    }
}

impl<T> fmt::Debug for PersistOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistOptions")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("skip_hydration", &self.skip_hydration)
            .field("migrate", &self.migrate.is_some())
            .finish()
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    state: &'a T,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    state: serde_json::Value,
    #[serde(default)]
    version: u32,
}

/// Middleware that writes every state to a [`StateStorage`] and restores
/// it on construction.
///
/// The stored value is JSON `{"state": ..., "version": N}`. Write failures
/// are logged and never reach the caller of `set_state`.
///
/// # Examples
///
/// ```
/// use tinstore::middleware::{MemoryStorage, Persist, PersistOptions};
/// use tinstore::{StateStore, Store};
///
/// let storage = MemoryStorage::new();
/// let store = Persist::new(Store::new(0u32), storage.clone(), PersistOptions::new("n"));
/// store.set_state("set", &|_| 7);
///
/// // A fresh store on the same storage starts where the last one stopped.
/// let restored = Persist::new(Store::new(0u32), storage, PersistOptions::new("n"));
/// assert_eq!(restored.get_state(), 7);
/// ```
pub struct Persist<S, T> {
    inner: S,
    storage: Arc<dyn StateStorage>,
    options: PersistOptions<T>,
    hydrated: AtomicBool,
}

impl<S, T> Persist<S, T>
where
    S: StateStore<T>,
    T: Serialize + DeserializeOwned + Clone,
{
    /// Wrap `inner` and restore from `storage` unless hydration is skipped.
    pub fn new<B>(inner: S, storage: B, options: PersistOptions<T>) -> Self
    where
        B: StateStorage + 'static,
    {
        let persist = Self {
            inner,
            storage: Arc::new(storage),
            options,
            hydrated: AtomicBool::new(false),
        };
        if !persist.options.skip_hydration {
            if let Err(err) = persist.rehydrate() {
                tracing::warn!(
                    key = %persist.options.name,
                    error = %err,
                    "could not restore persisted state; keeping initial state"
                );
            }
        }
        persist
    }

    /// Restore the persisted state into the wrapped store.
    ///
    /// A missing key leaves the current state untouched and still counts
    /// as hydrated.
    pub fn rehydrate(&self) -> Result<(), PersistError> {
        let key = &self.options.name;
        let Some(raw) = self.storage.get_item(key)? else {
            tracing::debug!(key = %key, "nothing persisted yet");
            self.hydrated.store(true, Ordering::SeqCst);
            return Ok(());
        };

        let envelope: Envelope =
            serde_json::from_str(&raw).map_err(|source| PersistError::Deserialize {
                key: key.clone(),
                source,
            })?;

        let migrated = envelope.version != self.options.version;
        let restored: T = if !migrated {
            serde_json::from_value(envelope.state).map_err(|source| {
                PersistError::Deserialize {
                    key: key.clone(),
                    source,
                }
            })?
        } else if let Some(migrate) = &self.options.migrate {
            tracing::debug!(
                key = %key,
                from = envelope.version,
                to = self.options.version,
                "migrating persisted state"
            );
            migrate(envelope.state, envelope.version)?
        } else {
            return Err(PersistError::VersionMismatch {
                key: key.clone(),
                stored: envelope.version,
                expected: self.options.version,
            });
        };

        self.inner.set_state(REHYDRATE_ACTION, &|_| restored.clone());
        if migrated {
            self.write(&restored)?;
        }
        self.hydrated.store(true, Ordering::SeqCst);
        tracing::debug!(key = %key, "rehydrated persisted state");
        Ok(())
    }

    /// Remove the persisted value. The in-memory state is untouched.
    pub fn clear_storage(&self) -> Result<(), PersistError> {
        self.storage.remove_item(&self.options.name)?;
        Ok(())
    }

    /// True once a rehydration has completed successfully.
    pub fn has_hydrated(&self) -> bool {
        self.hydrated.load(Ordering::SeqCst)
    }

    /// Settings this instance was created with.
    pub fn options(&self) -> &PersistOptions<T> {
        &self.options
    }

    fn write(&self, state: &T) -> Result<(), PersistError> {
        let key = &self.options.name;
        let envelope = EnvelopeRef {
            state,
            version: self.options.version,
        };
        let raw = serde_json::to_string(&envelope).map_err(|source| PersistError::Serialize {
            key: key.clone(),
            source,
        })?;
        self.storage.set_item(key, &raw)?;
        Ok(())
    }
}

impl<S, T> StateStore<T> for Persist<S, T>
where
    S: StateStore<T>,
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    fn get_state(&self) -> T {
        self.inner.get_state()
    }

    fn set_state(&self, action: &str, update: &dyn Fn(&T) -> T) {
        self.inner.set_state(action, update);
        let state = self.inner.get_state();
        if let Err(err) = self.write(&state) {
            tracing::warn!(
                key = %self.options.name,
                action,
                error = %err,
                "failed to persist state"
            );
        }
    }

    fn subscribe(&self, listener: Listener<T>) -> Subscription {
        self.inner.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::MemoryStorage;
    use crate::store::Store;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Prefs {
        theme: Option<String>,
    }

    fn dark(_: &Prefs) -> Prefs {
        Prefs {
            theme: Some("dark".to_string()),
        }
    }

    struct FailingStorage;

    impl StateStorage for FailingStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set_item(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey {
                key: key.to_string(),
            })
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn writes_envelope_on_every_change() {
        let storage = MemoryStorage::new();
        let store = Persist::new(
            Store::new(Prefs::default()),
            storage.clone(),
            PersistOptions::new("prefs"),
        );

        store.set_state("dark", &dark);

        let raw = storage.get_item("prefs").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, json!({ "state": { "theme": "dark" }, "version": 0 }));
    }

    #[test]
    fn restores_on_construction() {
        let storage = MemoryStorage::new();
        storage
            .set_item("prefs", r#"{"state":{"theme":"light"},"version":0}"#)
            .unwrap();

        let store = Persist::new(
            Store::new(Prefs::default()),
            storage,
            PersistOptions::new("prefs"),
        );

        assert!(store.has_hydrated());
        assert_eq!(store.get_state().theme.as_deref(), Some("light"));
    }

    #[test]
    fn missing_key_keeps_initial_state() {
        let store = Persist::new(
            Store::new(Prefs::default()),
            MemoryStorage::new(),
            PersistOptions::new("prefs"),
        );

        assert!(store.has_hydrated());
        assert_eq!(store.get_state(), Prefs::default());
    }

    #[test]
    fn version_mismatch_without_migration_keeps_initial_state() {
        let storage = MemoryStorage::new();
        storage
            .set_item("prefs", r#"{"state":{"theme":"light"},"version":1}"#)
            .unwrap();

        let store = Persist::new(
            Store::new(Prefs::default()),
            storage,
            PersistOptions::new("prefs").version(2),
        );

        assert!(!store.has_hydrated());
        assert_eq!(store.get_state(), Prefs::default());
        assert!(matches!(
            store.rehydrate(),
            Err(PersistError::VersionMismatch {
                stored: 1,
                expected: 2,
                ..
            })
        ));
    }

    #[test]
    fn migration_runs_and_writes_back() {
        let storage = MemoryStorage::new();
        storage
            .set_item("prefs", r#"{"state":{"colour":"blue"},"version":0}"#)
            .unwrap();

        let options = PersistOptions::new("prefs")
            .version(1)
            .migrate(|old, from| {
                assert_eq!(from, 0);
                Ok(Prefs {
                    theme: old["colour"].as_str().map(str::to_string),
                })
            });
        let store = Persist::new(Store::new(Prefs::default()), storage.clone(), options);

        assert_eq!(store.get_state().theme.as_deref(), Some("blue"));
        let raw = storage.get_item("prefs").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], json!(1));
        assert_eq!(value["state"]["theme"], json!("blue"));
    }

    #[test]
    fn failed_migration_keeps_initial_state() {
        let storage = MemoryStorage::new();
        storage
            .set_item("prefs", r#"{"state":{"colour":7},"version":0}"#)
            .unwrap();

        let options = PersistOptions::new("prefs").version(1).migrate(|old, _| {
            old["colour"]
                .as_str()
                .map(|colour| Prefs {
                    theme: Some(colour.to_string()),
                })
                .ok_or_else(|| PersistError::Migration {
                    key: "prefs".to_string(),
                    message: "colour is not a string".to_string(),
                })
        });
        let store = Persist::new(Store::new(Prefs::default()), storage.clone(), options);

        assert!(!store.has_hydrated());
        assert_eq!(store.get_state(), Prefs::default());
        assert_eq!(store.options().version, 1);
        assert!(matches!(
            store.rehydrate(),
            Err(PersistError::Migration { .. })
        ));
        // The stale value is left for a later, fixed migration.
        let raw = storage.get_item("prefs").unwrap().unwrap();
        assert!(raw.contains("\"version\":0"));
    }

    #[test]
    fn skip_hydration_defers_restore() {
        let storage = MemoryStorage::new();
        storage
            .set_item("prefs", r#"{"state":{"theme":"light"},"version":0}"#)
            .unwrap();

        let store = Persist::new(
            Store::new(Prefs::default()),
            storage,
            PersistOptions::new("prefs").skip_hydration(),
        );
        assert!(!store.has_hydrated());
        assert_eq!(store.get_state(), Prefs::default());

        store.rehydrate().unwrap();
        assert!(store.has_hydrated());
        assert_eq!(store.get_state().theme.as_deref(), Some("light"));
    }

    #[test]
    fn corrupt_value_is_reported_by_rehydrate() {
        let storage = MemoryStorage::new();
        storage.set_item("prefs", "not json").unwrap();

        let store = Persist::new(
            Store::new(Prefs::default()),
            storage,
            PersistOptions::new("prefs"),
        );

        assert_eq!(store.get_state(), Prefs::default());
        assert!(matches!(
            store.rehydrate(),
            Err(PersistError::Deserialize { .. })
        ));
    }

    #[test]
    fn write_failure_does_not_block_state_change() {
        let store = Persist::new(
            Store::new(Prefs::default()),
            FailingStorage,
            PersistOptions::new("prefs"),
        );

        store.set_state("dark", &dark);
        assert_eq!(store.get_state().theme.as_deref(), Some("dark"));
    }

    #[test]
    fn clear_storage_removes_value_only() {
        let storage = MemoryStorage::new();
        let store = Persist::new(
            Store::new(Prefs::default()),
            storage.clone(),
            PersistOptions::new("prefs"),
        );
        store.set_state("dark", &dark);

        store.clear_storage().unwrap();

        assert_eq!(storage.get_item("prefs").unwrap(), None);
        assert_eq!(store.get_state().theme.as_deref(), Some("dark"));
    }
}
