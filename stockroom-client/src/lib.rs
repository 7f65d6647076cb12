//! Stockroom Client
//!
//! Wires the query cache, a remote backend and the preference stores into
//! one handle. Mutations project their expected result into the cache,
//! call the backend once, then roll back or commit and invalidate the
//! views they affect.

pub mod config;
pub mod error;
pub mod mutations;
pub mod queries;
pub mod rest;
pub mod telemetry;

pub use config::{ClientConfig, ConfigError, PreferencesBackend, CONFIG_ENV_VAR};
pub use error::ClientError;
pub use mutations::{BatchLine, Mutations, StockEntryInput, StockExitInput, TechnicianBatchInput};
pub use queries::Queries;
pub use rest::RestBackend;
pub use telemetry::{init_tracing, TelemetryConfig};

use std::sync::Arc;
use stockroom_core::{Clock, InventoryBackend, SystemClock};
use stockroom_storage::{
    FileKeyValueStore, KeyValueStore, LmdbKeyValueStore, OrganizationStore, QueryCache,
    TaskDismissalStore,
};

/// Client handle: shared cache, backend and preference storage.
pub struct StockroomClient<B = RestBackend> {
    cache: Arc<QueryCache>,
    backend: Arc<B>,
    preferences: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl StockroomClient<RestBackend> {
    /// Build a REST-backed client from validated configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = Arc::new(QueryCache::with_clock(config.cache_config(), Arc::clone(&clock)));
        let backend = Arc::new(RestBackend::new(config)?);
        let preferences = open_preferences(config)?;

        tracing::info!(
            backend_url = %backend.base_url(),
            preferences = ?config.preferences.backend,
            "Stockroom client ready"
        );
        Ok(Self::with_parts(cache, backend, preferences, clock))
    }
}

impl<B: InventoryBackend> StockroomClient<B> {
    pub fn with_parts(
        cache: Arc<QueryCache>,
        backend: Arc<B>,
        preferences: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache,
            backend,
            preferences,
            clock,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn mutations(&self) -> Mutations<B> {
        Mutations::new(Arc::clone(&self.cache), Arc::clone(&self.backend))
    }

    pub fn queries(&self) -> Queries<B> {
        Queries::new(Arc::clone(&self.cache), Arc::clone(&self.backend))
    }

    /// Current-organization store hydrated from preference storage.
    pub fn organization_store(&self) -> OrganizationStore {
        OrganizationStore::open(Arc::clone(&self.preferences))
    }

    /// Dismissed-task store hydrated from preference storage.
    pub fn dismissal_store(&self) -> TaskDismissalStore {
        TaskDismissalStore::open(Arc::clone(&self.preferences), Arc::clone(&self.clock))
    }
}

fn open_preferences(config: &ClientConfig) -> Result<Arc<dyn KeyValueStore>, ClientError> {
    let section = &config.preferences;
    let store: Arc<dyn KeyValueStore> = match section.backend {
        PreferencesBackend::File => Arc::new(FileKeyValueStore::new(&section.path)),
        PreferencesBackend::Lmdb => {
            let max_size_mb = section.lmdb_max_size_mb.ok_or(ConfigError::InvalidValue {
                field: "preferences.lmdb_max_size_mb",
                reason: "required for the lmdb backend".to_string(),
            })?;
            Arc::new(LmdbKeyValueStore::open(&section.path, max_size_mb)?)
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::ManualClock;
    use stockroom_storage::MemoryKeyValueStore;
    use stockroom_test_utils::{fixtures, MockInventoryBackend};

    fn config_toml(backend: &str, path: &std::path::Path) -> String {
        format!(
            r#"
backend_url = "https://stock.example.com"
anon_key = "anon"
request_timeout_ms = 2000

[cache]
stale_time_ms = 30000
event_capacity = 16

[preferences]
backend = "{}"
path = "{}"
lmdb_max_size_mb = 4
"#,
            backend,
            path.display()
        )
    }

    #[test]
    fn test_from_config_file_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::from_toml(&config_toml("file", dir.path())).unwrap();
        let client = StockroomClient::from_config(&config).unwrap();

        let mut dismissals = client.dismissal_store();
        dismissals.dismiss_task("low_stock", "p1").unwrap();
        assert!(dir.path().join("task-dismissals.json").exists());
        assert!(client.dismissal_store().is_task_dismissed("low_stock", "p1"));
    }

    #[test]
    fn test_from_config_lmdb_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::from_toml(&config_toml("lmdb", dir.path())).unwrap();
        let client = StockroomClient::from_config(&config).unwrap();
        assert!(client.organization_store().current_organization().is_none());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let toml = config_toml("file", dir.path()).replace("anon_key = \"anon\"", "anon_key = \" \"");
        let config = ClientConfig::from_toml(&toml).unwrap();
        assert!(matches!(
            StockroomClient::from_config(&config),
            Err(ClientError::Config(ConfigError::InvalidValue {
                field: "anon_key",
                ..
            }))
        ));
    }

    #[test]
    fn test_organization_selection_survives_reopen() {
        let preferences: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let client = StockroomClient::with_parts(
            Arc::new(QueryCache::default()),
            Arc::new(MockInventoryBackend::new()),
            Arc::clone(&preferences),
            Arc::new(ManualClock::at_millis(0)),
        );
        let org = fixtures::organization("Atelier");

        let mut store = client.organization_store();
        store.load_memberships(vec![org.clone()]).unwrap();

        let reopened = client.organization_store();
        assert_eq!(reopened.current_organization_id(), Some(org.id));
        assert!(reopened.is_loading());
        assert!(reopened.organizations().is_empty());
    }
}
