//! Persisted client preferences.
//!
//! Two independent stores, each persisted under its own name: the current
//! organization selection and the dismissed-task map.

pub mod dismissals;
pub mod kv;
pub mod lmdb;
pub mod organization;

pub use dismissals::{dismissal_key, TaskDismissalStore, DISMISSALS_STORE, DISMISSAL_TTL_MS};
pub use kv::{
    load_state, save_state, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore,
    PersistedEnvelope, PersistenceError, STATE_VERSION,
};
pub use lmdb::LmdbKeyValueStore;
pub use organization::{OrganizationStore, ORGANIZATION_STORE};
