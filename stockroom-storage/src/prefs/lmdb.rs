//! LMDB-backed preference store.
//!
//! Uses the heed crate (Rust bindings for LMDB). Every store name maps to
//! one entry of a single unnamed database; each write is its own
//! transaction.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use super::kv::{KeyValueStore, PersistenceError};

pub struct LmdbKeyValueStore {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbKeyValueStore {
    /// Open (or create) the environment at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, PersistenceError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(lmdb_error)?;

        let mut wtxn = env.write_txn().map_err(lmdb_error)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(lmdb_error)?;
        wtxn.commit().map_err(lmdb_error)?;

        tracing::debug!(path = %path.as_ref().display(), max_size_mb, "Opened LMDB preference store");
        Ok(Self { env, db })
    }
}

fn lmdb_error(e: heed::Error) -> PersistenceError {
    PersistenceError::Lmdb(e.to_string())
}

impl KeyValueStore for LmdbKeyValueStore {
    fn get(&self, name: &str) -> Result<Option<String>, PersistenceError> {
        let rtxn = self.env.read_txn().map_err(lmdb_error)?;
        let Some(bytes) = self.db.get(&rtxn, name.as_bytes()).map_err(lmdb_error)? else {
            return Ok(None);
        };
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| PersistenceError::Lmdb(format!("non UTF-8 value for {}: {}", name, e)))?;
        Ok(Some(text))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), PersistenceError> {
        let mut wtxn = self.env.write_txn().map_err(lmdb_error)?;
        self.db
            .put(&mut wtxn, name.as_bytes(), value.as_bytes())
            .map_err(lmdb_error)?;
        wtxn.commit().map_err(lmdb_error)
    }

    fn remove(&self, name: &str) -> Result<(), PersistenceError> {
        let mut wtxn = self.env.write_txn().map_err(lmdb_error)?;
        self.db
            .delete(&mut wtxn, name.as_bytes())
            .map_err(lmdb_error)?;
        wtxn.commit().map_err(lmdb_error)
    }
}
