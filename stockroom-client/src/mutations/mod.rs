//! Mutation orchestrators.
//!
//! Every mutation runs the same lifecycle:
//!
//! 1. validate the input locally (no remote call on failure);
//! 2. optionally project the expected result into the cache, keeping an
//!    [`OptimisticPatch`] per touched entry;
//! 3. call the backend once;
//! 4. commit the patches on success, roll them back newest-first on failure;
//! 5. invalidate the mutation's [`InvalidationPlan`] whatever the outcome.
//!
//! The cache is never locked across the remote call, so overlapping
//! mutations interleave freely; the patch ledger keeps their rollbacks
//! consistent.

mod catalog;
mod organizations;
mod stock;
mod technicians;

pub use stock::{BatchLine, StockEntryInput, StockExitInput, TechnicianBatchInput};

use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use stockroom_core::{
    InventoryBackend, Quantity, RestockItem, StockroomResult, StorageError, ValidationError,
};
use stockroom_storage::{CacheKey, InvalidationPlan, OptimisticPatch, QueryCache};

/// Optimistic mutations against one backend and one query cache.
pub struct Mutations<B> {
    cache: Arc<QueryCache>,
    backend: Arc<B>,
}

impl<B> Clone for Mutations<B> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: InventoryBackend> Mutations<B> {
    pub fn new(cache: Arc<QueryCache>, backend: Arc<B>) -> Self {
        Self { cache, backend }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Await the remote call, settle the patches, then invalidate.
    ///
    /// Cache failures while settling are logged; the caller always sees the
    /// remote outcome.
    async fn settle<T, Fut>(
        &self,
        operation: &'static str,
        patches: Vec<OptimisticPatch>,
        plan: InvalidationPlan,
        call: Fut,
    ) -> StockroomResult<T>
    where
        Fut: Future<Output = StockroomResult<T>>,
    {
        let result = call.await;

        match &result {
            Ok(_) => {
                for patch in patches {
                    if let Err(e) = self.cache.commit(patch) {
                        tracing::warn!(operation, error = %e, "Failed to commit optimistic patch");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(operation, error = %err, "Mutation failed");
                for patch in patches.into_iter().rev() {
                    let key = patch.key().clone();
                    match self.cache.rollback(patch) {
                        Ok(outcome) => {
                            tracing::debug!(operation, key = %key, ?outcome, "Settled rollback")
                        }
                        Err(e) => {
                            tracing::warn!(operation, key = %key, error = %e, "Rollback failed")
                        }
                    }
                }
            }
        }

        match self.cache.invalidate_many(&plan) {
            Ok(affected) => {
                tracing::debug!(operation, prefixes = plan.len(), affected, "Invalidated views")
            }
            Err(e) => tracing::warn!(operation, error = %e, "Invalidation failed"),
        }

        result
    }
}

fn positive(field: &str, value: i64) -> Result<Quantity, ValidationError> {
    Quantity::for_field(field, value)
}

fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Trim an edited text field, rejecting a blank replacement.
fn required_edit(field: &str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    value.map(|value| required(field, &value)).transpose()
}

fn batch_items(lines: &[BatchLine]) -> Result<Vec<RestockItem>, ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            Ok(RestockItem {
                product_id: line.product_id,
                quantity: positive(&format!("items[{}].quantity", index), line.quantity)?,
            })
        })
        .collect()
}

/// Edited fields of an update object, as merged into the cached entity.
fn edited_fields<T: Serialize>(key: &CacheKey, update: &T) -> StockroomResult<Map<String, Value>> {
    match serde_json::to_value(update) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(StorageError::Serialization {
            key: key.to_string(),
            reason: format!("expected an object, got {}", other),
        }
        .into()),
        Err(e) => Err(StorageError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        }
        .into()),
    }
}
