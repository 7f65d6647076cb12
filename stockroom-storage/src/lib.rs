//! Stockroom Storage - Query Cache and Client Preferences
//!
//! The client-side consistency layer: hierarchical cache keys, an in-memory
//! query cache with optimistic patches and prefix invalidation, and the
//! persisted preference stores.

pub mod cache;
pub mod prefs;

pub use cache::{
    project_stock_delta, remove_from_list, shallow_merge, CacheConfig, CacheEvent, CacheKey,
    CacheRead, CacheStats, CategoryKeys, DashboardKeys, EntityKeys, EntryState, Freshness,
    InvalidationPlan, InventoryKeys, KeySegment, MovementFilters, MovementKeys, Namespace,
    NamespaceKeys, OptimisticPatch, OrganizationKeys, ProductFilters, ProductKeys, QueryCache,
    RollbackOutcome, TechnicianKeys,
};
pub use prefs::{
    FileKeyValueStore, KeyValueStore, LmdbKeyValueStore, MemoryKeyValueStore, OrganizationStore,
    PersistenceError, TaskDismissalStore,
};
