//! In-memory query cache with invalidation and optimistic patches.
//!
//! `QueryCache` is an explicit, injectable store: tests build isolated
//! instances and the client shares one behind an `Arc`. All operations are
//! synchronous and take a single lock, so between two awaits of a caller
//! they are atomic with respect to each other. The lock is never held
//! across an `.await`.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use stockroom_core::{Clock, StockroomResult, StorageError, SystemClock};
use tokio::sync::broadcast;

use super::freshness::{CacheRead, Freshness};
use super::key::CacheKey;
use super::optimistic::{OptimisticPatch, PatchLedger, RollbackOutcome};

/// Configuration for the query cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Age after which a cached value is refetched on the next read.
    pub stale_time: Duration,
    /// Buffer size of the change notification channel.
    pub event_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(30),
            event_capacity: 256,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

/// Change notifications emitted by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A value was written (fetch, direct set, projection or rollback).
    Updated { key: CacheKey },
    /// A value was dropped.
    Removed { key: CacheKey },
    /// Entries under `prefix` went stale and should be refetched when next
    /// observed.
    Invalidated { prefix: CacheKey, affected: usize },
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
    /// Entries marked stale by invalidation.
    pub invalidations: u64,
    pub rollbacks: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Metadata of a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryState {
    pub updated_at: DateTime<Utc>,
    pub invalidated: bool,
    /// Optimistic patches currently in flight on this key.
    pub in_flight: usize,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    updated_at: DateTime<Utc>,
    invalidated: bool,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    ledger: PatchLedger,
    stats: CacheStats,
}

pub struct QueryCache {
    state: RwLock<CacheState>,
    events: broadcast::Sender<CacheEvent>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    next_patch_id: AtomicU64,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            state: RwLock::new(CacheState::default()),
            events,
            clock,
            config,
            next_patch_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn read(&self) -> StockroomResult<RwLockReadGuard<'_, CacheState>> {
        self.state.read().map_err(|_| StorageError::LockPoisoned.into())
    }

    fn write(&self) -> StockroomResult<RwLockWriteGuard<'_, CacheState>> {
        self.state.write().map_err(|_| StorageError::LockPoisoned.into())
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    // ------------------------------------------------------------------------
    // Plain reads and writes
    // ------------------------------------------------------------------------

    /// Raw cached value for a key.
    pub fn get(&self, key: &CacheKey) -> StockroomResult<Option<Value>> {
        Ok(self.read()?.entries.get(key).map(|e| e.value.clone()))
    }

    /// Cached value for a key, decoded into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &CacheKey) -> StockroomResult<Option<T>> {
        match self.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| serialization_error(key, e)),
            None => Ok(None),
        }
    }

    pub fn entry_state(&self, key: &CacheKey) -> StockroomResult<Option<EntryState>> {
        let state = self.read()?;
        Ok(state.entries.get(key).map(|entry| EntryState {
            updated_at: entry.updated_at,
            invalidated: entry.invalidated,
            in_flight: state.ledger.in_flight(key),
        }))
    }

    /// Whether the entry was invalidated since it was last written.
    /// Missing entries count as not invalidated.
    pub fn is_invalidated(&self, key: &CacheKey) -> StockroomResult<bool> {
        Ok(self
            .read()?
            .entries
            .get(key)
            .is_some_and(|entry| entry.invalidated))
    }

    /// Store a fresh value (e.g. a fetch result).
    pub fn set<T: Serialize>(&self, key: CacheKey, value: &T) -> StockroomResult<()> {
        let value = serde_json::to_value(value).map_err(|e| serialization_error(&key, e))?;
        self.set_value(key, value)
    }

    pub fn set_value(&self, key: CacheKey, value: Value) -> StockroomResult<()> {
        let now = self.clock.now();
        {
            let mut state = self.write()?;
            let previous = state.entries.insert(
                key.clone(),
                CacheEntry {
                    value,
                    updated_at: now,
                    invalidated: false,
                },
            );
            if previous.is_none() {
                state.stats.entry_count += 1;
            }
        }
        self.emit(CacheEvent::Updated { key });
        Ok(())
    }

    pub fn remove(&self, key: &CacheKey) -> StockroomResult<Option<Value>> {
        let removed = {
            let mut state = self.write()?;
            let removed = state.entries.remove(key);
            if removed.is_some() {
                state.stats.entry_count = state.stats.entry_count.saturating_sub(1);
            }
            removed
        };
        if removed.is_some() {
            self.emit(CacheEvent::Removed { key: key.clone() });
        }
        Ok(removed.map(|e| e.value))
    }

    /// Every cached entry whose key starts with `prefix`.
    pub fn entries_with_prefix(&self, prefix: &CacheKey) -> StockroomResult<Vec<(CacheKey, Value)>> {
        let state = self.read()?;
        let mut entries: Vec<(CacheKey, Value)> = state
            .entries
            .iter()
            .filter(|(key, _)| prefix.is_prefix_of(key))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    pub fn len(&self) -> StockroomResult<usize> {
        Ok(self.read()?.entries.len())
    }

    pub fn is_empty(&self) -> StockroomResult<bool> {
        Ok(self.read()?.entries.is_empty())
    }

    /// Drop everything, including in-flight patch bookkeeping.
    pub fn clear(&self) -> StockroomResult<()> {
        let mut state = self.write()?;
        state.entries.clear();
        state.ledger.clear();
        state.stats.entry_count = 0;
        Ok(())
    }

    pub fn stats(&self) -> StockroomResult<CacheStats> {
        Ok(self.read()?.stats.clone())
    }

    // ------------------------------------------------------------------------
    // Invalidation
    // ------------------------------------------------------------------------

    /// Mark every entry under `prefix` as stale. Returns how many entries
    /// were affected. The `Invalidated` event is emitted even when nothing
    /// is cached yet, so observers of not-yet-loaded views can react too.
    pub fn invalidate(&self, prefix: &CacheKey) -> StockroomResult<usize> {
        let affected = {
            let mut state = self.write()?;
            let mut affected = 0;
            for (key, entry) in state.entries.iter_mut() {
                if prefix.is_prefix_of(key) {
                    entry.invalidated = true;
                    affected += 1;
                }
            }
            state.stats.invalidations += affected as u64;
            affected
        };
        tracing::debug!(prefix = %prefix, affected, "Invalidated cache prefix");
        self.emit(CacheEvent::Invalidated {
            prefix: prefix.clone(),
            affected,
        });
        Ok(affected)
    }

    /// Invalidate several prefixes, returning the total affected count.
    pub fn invalidate_many<'a, I>(&self, prefixes: I) -> StockroomResult<usize>
    where
        I: IntoIterator<Item = &'a CacheKey>,
    {
        let mut total = 0;
        for prefix in prefixes {
            total += self.invalidate(prefix)?;
        }
        Ok(total)
    }

    // ------------------------------------------------------------------------
    // Read-through
    // ------------------------------------------------------------------------

    /// Read a value, going to the backend through `fetcher` when the cached
    /// copy does not satisfy `freshness`.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: CacheKey,
        freshness: Freshness,
        fetcher: F,
    ) -> StockroomResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StockroomResult<T>>,
    {
        if let Freshness::BestEffort { max_staleness } = freshness {
            if let Some(hit) = self.cached_within::<T>(&key, max_staleness)? {
                return Ok(hit);
            }
        }

        self.write()?.stats.misses += 1;
        let value = fetcher().await?;
        let fetched_at = self.clock.now();
        self.set(key, &value)?;
        Ok(CacheRead::from_backend(value, fetched_at))
    }

    /// Read-through with the configured stale time.
    pub async fn fetch_default<T, F, Fut>(
        &self,
        key: CacheKey,
        fetcher: F,
    ) -> StockroomResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StockroomResult<T>>,
    {
        let freshness = Freshness::best_effort(self.config.stale_time);
        self.fetch(key, freshness, fetcher).await
    }

    fn cached_within<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        max_staleness: Duration,
    ) -> StockroomResult<Option<CacheRead<T>>> {
        let now = self.clock.now();
        let mut state = self.write()?;
        let Some(entry) = state.entries.get(key) else {
            return Ok(None);
        };
        let age = (now - entry.updated_at).to_std().unwrap_or(Duration::ZERO);
        if entry.invalidated || age > max_staleness {
            return Ok(None);
        }
        let value: T =
            serde_json::from_value(entry.value.clone()).map_err(|e| serialization_error(key, e))?;
        let cached_at = entry.updated_at;
        state.stats.hits += 1;
        Ok(Some(CacheRead::from_cache(value, cached_at)))
    }

    // ------------------------------------------------------------------------
    // Optimistic patches
    // ------------------------------------------------------------------------

    /// Snapshot the value at `key` and write `project(current)` in its place.
    ///
    /// Returns `None` (and writes nothing) when the key is not cached or the
    /// projection declines to change it.
    pub fn begin_patch<F>(&self, key: &CacheKey, project: F) -> StockroomResult<Option<OptimisticPatch>>
    where
        F: FnOnce(&Value) -> Option<Value>,
    {
        let now = self.clock.now();
        let patch = {
            let mut state = self.write()?;
            self.apply_patch(&mut state, key, project, now)
        };
        if let Some(patch) = &patch {
            tracing::debug!(key = %patch.key, patch_id = patch.id, "Applied optimistic patch");
            self.emit(CacheEvent::Updated {
                key: patch.key.clone(),
            });
        }
        Ok(patch)
    }

    /// Apply `project` to every cached entry under `prefix` in one step,
    /// snapshotting each changed entry individually.
    pub fn begin_patches_under<F>(
        &self,
        prefix: &CacheKey,
        project: F,
    ) -> StockroomResult<Vec<OptimisticPatch>>
    where
        F: Fn(&Value) -> Option<Value>,
    {
        let now = self.clock.now();
        let patches = {
            let mut state = self.write()?;
            let mut keys: Vec<CacheKey> = state
                .entries
                .keys()
                .filter(|key| prefix.is_prefix_of(key))
                .cloned()
                .collect();
            keys.sort();
            keys.iter()
                .filter_map(|key| self.apply_patch(&mut state, key, &project, now))
                .collect::<Vec<_>>()
        };
        for patch in &patches {
            tracing::debug!(key = %patch.key, patch_id = patch.id, "Applied optimistic patch");
            self.emit(CacheEvent::Updated {
                key: patch.key.clone(),
            });
        }
        Ok(patches)
    }

    fn apply_patch<F>(
        &self,
        state: &mut CacheState,
        key: &CacheKey,
        project: F,
        now: DateTime<Utc>,
    ) -> Option<OptimisticPatch>
    where
        F: FnOnce(&Value) -> Option<Value>,
    {
        let entry = state.entries.get_mut(key)?;
        let projected = project(&entry.value)?;
        let snapshot = std::mem::replace(&mut entry.value, projected);
        entry.updated_at = now;

        let id = self.next_patch_id.fetch_add(1, Ordering::Relaxed);
        state.ledger.push(key.clone(), id, snapshot);
        Some(OptimisticPatch {
            id,
            key: key.clone(),
        })
    }

    /// The remote call confirmed the mutation: drop the snapshot.
    pub fn commit(&self, patch: OptimisticPatch) -> StockroomResult<()> {
        self.write()?.ledger.commit(&patch.key, patch.id);
        Ok(())
    }

    /// The remote call failed: put the pre-mutation value back.
    ///
    /// When a later patch on the same key is still in flight, its projection
    /// stays visible and inherits this patch's snapshot; the entry is marked
    /// stale so the next read reconciles with the server.
    pub fn rollback(&self, patch: OptimisticPatch) -> StockroomResult<RollbackOutcome> {
        let now = self.clock.now();
        let outcome = {
            let mut state = self.write()?;
            let (outcome, snapshot) = state.ledger.rollback(&patch.key, patch.id);
            match (outcome, snapshot) {
                (RollbackOutcome::Restored, Some(snapshot)) => {
                    let is_new = !state.entries.contains_key(&patch.key);
                    state.entries.insert(
                        patch.key.clone(),
                        CacheEntry {
                            value: snapshot,
                            updated_at: now,
                            invalidated: false,
                        },
                    );
                    if is_new {
                        state.stats.entry_count += 1;
                    }
                }
                (RollbackOutcome::Superseded, _) => {
                    if let Some(entry) = state.entries.get_mut(&patch.key) {
                        entry.invalidated = true;
                    }
                }
                _ => {}
            }
            if outcome != RollbackOutcome::Unknown {
                state.stats.rollbacks += 1;
            }
            outcome
        };

        match outcome {
            RollbackOutcome::Restored => {
                tracing::warn!(key = %patch.key, patch_id = patch.id, "Rolled back optimistic patch");
                self.emit(CacheEvent::Updated { key: patch.key });
            }
            RollbackOutcome::Superseded => {
                tracing::warn!(
                    key = %patch.key,
                    patch_id = patch.id,
                    "Rolled back optimistic patch under a newer projection"
                );
            }
            RollbackOutcome::Unknown => {}
        }
        Ok(outcome)
    }

    /// Number of optimistic patches in flight on `key`.
    pub fn in_flight(&self, key: &CacheKey) -> StockroomResult<usize> {
        Ok(self.read()?.ledger.in_flight(key))
    }
}

fn serialization_error(key: &CacheKey, err: serde_json::Error) -> stockroom_core::StockroomError {
    StorageError::Serialization {
        key: key.to_string(),
        reason: err.to_string(),
    }
    .into()
}
