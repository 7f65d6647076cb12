//! Optimistic patches.
//!
//! A patch is the snapshot of a cached value taken right before a
//! speculative write, owned by the mutation that made it. Patches on the
//! same key are kept in application order so that rolling back an earlier
//! patch never clobbers a later projection: the earlier snapshot is handed
//! down to the next patch instead, and only the most recent patch ever
//! writes its snapshot back.

use serde_json::{Map, Value};
use std::collections::HashMap;

use super::key::CacheKey;

/// Handle to one speculative write.
///
/// Not `Clone`: exactly one of [`QueryCache::commit`] or
/// [`QueryCache::rollback`] consumes it.
///
/// [`QueryCache::commit`]: super::QueryCache::commit
/// [`QueryCache::rollback`]: super::QueryCache::rollback
#[derive(Debug)]
#[must_use = "an optimistic patch must be committed or rolled back"]
pub struct OptimisticPatch {
    pub(crate) id: u64,
    pub(crate) key: CacheKey,
}

impl OptimisticPatch {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

/// What a rollback did to the cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// The snapshot was written back over the projection.
    Restored,
    /// A later patch owns the value; the snapshot was handed down to it.
    Superseded,
    /// The patch was no longer tracked (already settled).
    Unknown,
}

#[derive(Debug, Clone)]
struct PatchRecord {
    id: u64,
    snapshot: Value,
    /// Confirmed by the server while an earlier patch is still pending.
    /// Kept as a marker so the earlier rollback cannot overwrite it.
    committed: bool,
}

/// Patches per key, oldest first. The oldest record is always pending.
#[derive(Debug, Default)]
pub(crate) struct PatchLedger {
    by_key: HashMap<CacheKey, Vec<PatchRecord>>,
}

impl PatchLedger {
    pub(crate) fn push(&mut self, key: CacheKey, id: u64, snapshot: Value) {
        self.by_key.entry(key).or_default().push(PatchRecord {
            id,
            snapshot,
            committed: false,
        });
    }

    /// Confirm a patch. Later patches keep their snapshots since they were
    /// taken on top of a value the server has now confirmed.
    pub(crate) fn commit(&mut self, key: &CacheKey, id: u64) -> bool {
        let Some(records) = self.by_key.get_mut(key) else {
            return false;
        };
        let Some(index) = records.iter().position(|r| r.id == id && !r.committed) else {
            return false;
        };
        if index == 0 {
            records.remove(index);
        } else {
            records[index].committed = true;
        }
        self.compact(key);
        true
    }

    /// Undo a failed patch.
    ///
    /// Returns the snapshot to write back when this patch is the most
    /// recent one on its key, or `None` when a later patch (pending or
    /// confirmed) took over.
    pub(crate) fn rollback(&mut self, key: &CacheKey, id: u64) -> (RollbackOutcome, Option<Value>) {
        let Some(records) = self.by_key.get_mut(key) else {
            return (RollbackOutcome::Unknown, None);
        };
        let Some(index) = records.iter().position(|r| r.id == id && !r.committed) else {
            return (RollbackOutcome::Unknown, None);
        };

        let record = records.remove(index);
        let outcome = if index == records.len() {
            (RollbackOutcome::Restored, Some(record.snapshot))
        } else {
            records[index].snapshot = record.snapshot;
            (RollbackOutcome::Superseded, None)
        };
        self.compact(key);
        outcome
    }

    /// Drop confirmed markers no pending patch precedes.
    fn compact(&mut self, key: &CacheKey) {
        if let Some(records) = self.by_key.get_mut(key) {
            let settled = records.iter().take_while(|r| r.committed).count();
            records.drain(..settled);
            if records.is_empty() {
                self.by_key.remove(key);
            }
        }
    }

    /// Pending patches on `key`.
    pub(crate) fn in_flight(&self, key: &CacheKey) -> usize {
        self.by_key
            .get(key)
            .map_or(0, |records| records.iter().filter(|r| !r.committed).count())
    }

    pub(crate) fn clear(&mut self) {
        self.by_key.clear();
    }
}

// ============================================================================
// PROJECTIONS
// ============================================================================

/// Project a stock movement onto a cached product: `stock_current + delta`.
///
/// Returns `None` when the value carries no numeric `stock_current`.
pub fn project_stock_delta(value: &Value, delta: i64) -> Option<Value> {
    let mut object = value.as_object()?.clone();
    let current = object.get("stock_current")?.as_i64()?;
    object.insert(
        "stock_current".to_string(),
        Value::from(current.saturating_add(delta)),
    );
    Some(Value::Object(object))
}

/// Shallow-merge edited fields into a cached object.
pub fn shallow_merge(value: &Value, fields: &Map<String, Value>) -> Option<Value> {
    let mut object = value.as_object()?.clone();
    for (field, field_value) in fields {
        object.insert(field.clone(), field_value.clone());
    }
    Some(Value::Object(object))
}

/// Filter the entity with the given id out of a cached list.
///
/// Returns `None` when the value is not a list or does not contain the id,
/// so untouched lists get no patch.
pub fn remove_from_list(value: &Value, id: &str) -> Option<Value> {
    let items = value.as_array()?;
    let kept: Vec<Value> = items
        .iter()
        .filter(|item| item.get("id").and_then(Value::as_str) != Some(id))
        .cloned()
        .collect();
    if kept.len() == items.len() {
        return None;
    }
    Some(Value::Array(kept))
}
