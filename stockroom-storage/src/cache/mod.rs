//! Query cache with hierarchical keys and optimistic updates.
//!
//! Every cached query result lives under a [`CacheKey`] built by the key
//! registry. Keys form a tree per namespace: invalidating a key marks every
//! key under it as stale, and the next read through [`QueryCache::fetch`]
//! goes back to the backend.
//!
//! # Optimistic updates
//!
//! Mutations follow a three-phase protocol: snapshot and speculative write
//! ([`QueryCache::begin_patch`]), the remote call, then either
//! [`QueryCache::commit`] or [`QueryCache::rollback`]. Every mutation then
//! invalidates its [`InvalidationPlan`].
//!
//! # Example
//!
//! ```ignore
//! let key = ProductKeys::detail(product_id);
//! let patch = cache.begin_patch(&key, |v| project_stock_delta(v, 10))?;
//! match backend.create_stock_entry(input).await {
//!     Ok(movement) => { /* commit, invalidate */ }
//!     Err(err) => { /* rollback, invalidate, return err */ }
//! }
//! ```

pub mod freshness;
pub mod invalidation;
pub mod key;
pub mod optimistic;
pub mod query_cache;
pub mod registry;

pub use freshness::{CacheRead, Freshness};
pub use invalidation::InvalidationPlan;
pub use key::{CacheKey, KeySegment, Namespace};
pub use optimistic::{
    project_stock_delta, remove_from_list, shallow_merge, OptimisticPatch, RollbackOutcome,
};
pub use query_cache::{CacheConfig, CacheEvent, CacheStats, EntryState, QueryCache};
pub use registry::{
    CategoryKeys, DashboardKeys, EntityKeys, InventoryKeys, MovementFilters, MovementKeys,
    NamespaceKeys, OrganizationKeys, ProductFilters, ProductKeys, TechnicianKeys,
};
