//! Dismissed dashboard tasks.
//!
//! A dismissal hides a task (e.g. "restock product X") for 24 hours. Entries
//! are keyed `"<type>:<entity id>"` and hold the dismissal time in
//! milliseconds since the epoch. Expired entries stay in the map until
//! [`TaskDismissalStore::clear_expired`] prunes them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use stockroom_core::Clock;

use super::kv::{load_state, save_state, KeyValueStore, PersistenceError};

/// Name of the persisted store.
pub const DISMISSALS_STORE: &str = "task-dismissals";

/// How long a dismissal stays active, in milliseconds.
pub const DISMISSAL_TTL_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DismissalState {
    dismissed_tasks: BTreeMap<String, i64>,
}

pub fn dismissal_key(task_type: &str, entity_id: &str) -> String {
    format!("{}:{}", task_type, entity_id)
}

fn is_active(now: i64, dismissed_at: i64) -> bool {
    now.saturating_sub(dismissed_at) < DISMISSAL_TTL_MS
}

pub struct TaskDismissalStore {
    state: DismissalState,
    clock: Arc<dyn Clock>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl std::fmt::Debug for TaskDismissalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDismissalStore")
            .field("dismissed_tasks", &self.state.dismissed_tasks)
            .field("persisted", &self.store.is_some())
            .finish()
    }
}

impl TaskDismissalStore {
    /// A store that keeps nothing across sessions.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: DismissalState::default(),
            clock,
            store: None,
        }
    }

    /// Hydrate from `store`. Unreadable state is logged and replaced by an
    /// empty map.
    pub fn open(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let state = match load_state::<DismissalState>(store.as_ref(), DISMISSALS_STORE) {
            Ok(Some(state)) => state,
            Ok(None) => DismissalState::default(),
            Err(e) => {
                tracing::warn!(error = %e, store = DISMISSALS_STORE, "Failed to load persisted dismissals");
                DismissalState::default()
            }
        };
        Self {
            state,
            clock,
            store: Some(store),
        }
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        match &self.store {
            Some(store) => save_state(store.as_ref(), DISMISSALS_STORE, &self.state),
            None => Ok(()),
        }
    }

    pub fn dismiss_task(&mut self, task_type: &str, entity_id: &str) -> Result<(), PersistenceError> {
        let now = self.clock.now_millis();
        self.state
            .dismissed_tasks
            .insert(dismissal_key(task_type, entity_id), now);
        self.persist()
    }

    pub fn is_task_dismissed(&self, task_type: &str, entity_id: &str) -> bool {
        let now = self.clock.now_millis();
        self.state
            .dismissed_tasks
            .get(&dismissal_key(task_type, entity_id))
            .is_some_and(|&at| is_active(now, at))
    }

    /// Drop every dismissal at least 24 hours old. Returns how many were
    /// removed.
    pub fn clear_expired(&mut self) -> Result<usize, PersistenceError> {
        let now = self.clock.now_millis();
        let before = self.state.dismissed_tasks.len();
        self.state
            .dismissed_tasks
            .retain(|_, &mut at| is_active(now, at));
        let removed = before - self.state.dismissed_tasks.len();
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.state.dismissed_tasks.clear();
        self.persist()
    }

    pub fn len(&self) -> usize {
        self.state.dismissed_tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.dismissed_tasks.is_empty()
    }
}
