//! Key-value persistence for client preferences.
//!
//! Preference stores serialize their state on every write and deserialize it
//! once on open. The backing store is a plain name → JSON text map; the
//! JSON document is wrapped in a [`PersistedEnvelope`].

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Current version of the persisted envelope.
pub const STATE_VERSION: u32 = 0;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("LMDB error: {0}")]
    Lmdb(String),
    #[error("Invalid store name: {0:?}")]
    InvalidName(String),
    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl From<PersistenceError> for stockroom_core::StockroomError {
    fn from(e: PersistenceError) -> Self {
        stockroom_core::StorageError::Backend {
            reason: e.to_string(),
        }
        .into()
    }
}

/// Durable storage for named JSON documents.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, name: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, name: &str) -> Result<(), PersistenceError>;
}

/// On-disk layout of every persisted store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEnvelope<T> {
    pub state: T,
    pub version: u32,
}

/// Read and decode the state persisted under `name`.
pub fn load_state<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    name: &str,
) -> Result<Option<T>, PersistenceError> {
    let Some(contents) = store.get(name)? else {
        return Ok(None);
    };
    let envelope = serde_json::from_str::<PersistedEnvelope<T>>(&contents)?;
    Ok(Some(envelope.state))
}

pub fn save_state<T: Serialize>(
    store: &dyn KeyValueStore,
    name: &str,
    state: &T,
) -> Result<(), PersistenceError> {
    let envelope = PersistedEnvelope {
        state,
        version: STATE_VERSION,
    };
    let contents = serde_json::to_string(&envelope)?;
    store.set(name, &contents)
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Volatile store, for tests and sessions without a profile directory.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, name: &str) -> Result<Option<String>, PersistenceError> {
        let values = self.values.read().map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(values.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), PersistenceError> {
        let mut values = self.values.write().map_err(|_| PersistenceError::LockPoisoned)?;
        values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), PersistenceError> {
        let mut values = self.values.write().map_err(|_| PersistenceError::LockPoisoned)?;
        values.remove(name);
        Ok(())
    }
}

// ============================================================================
// JSON FILES
// ============================================================================

/// One `<name>.json` file per store inside a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistenceError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, name: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(name)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(path, value)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(name)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
