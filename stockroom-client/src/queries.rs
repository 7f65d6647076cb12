//! Read-through queries.

use std::sync::Arc;
use stockroom_core::{InventoryBackend, Organization, Product, ProductId, StockroomResult, UserId};
use stockroom_storage::{
    CacheRead, EntityKeys, Freshness, OrganizationKeys, OrganizationStore, ProductKeys, QueryCache,
};

/// Cached reads against one backend.
pub struct Queries<B> {
    cache: Arc<QueryCache>,
    backend: Arc<B>,
}

impl<B> Clone for Queries<B> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: InventoryBackend> Queries<B> {
    pub fn new(cache: Arc<QueryCache>, backend: Arc<B>) -> Self {
        Self { cache, backend }
    }

    pub async fn product(
        &self,
        product_id: ProductId,
        freshness: Freshness,
    ) -> StockroomResult<CacheRead<Product>> {
        let backend = Arc::clone(&self.backend);
        self.cache
            .fetch(ProductKeys::detail(product_id), freshness, || async move {
                backend.fetch_product(product_id).await
            })
            .await
    }

    pub async fn memberships(
        &self,
        user_id: UserId,
        freshness: Freshness,
    ) -> StockroomResult<CacheRead<Vec<Organization>>> {
        let backend = Arc::clone(&self.backend);
        self.cache
            .fetch(OrganizationKeys::list(Some(user_id)), freshness, || async move {
                backend.list_memberships(user_id).await
            })
            .await
    }

    /// Fetch the user's memberships and revalidate the persisted selection.
    ///
    /// On failure the store stays as it was, except that it stops loading.
    pub async fn load_organizations(
        &self,
        store: &mut OrganizationStore,
        user_id: UserId,
    ) -> StockroomResult<()> {
        store.set_loading(true);
        let organizations = match self.memberships(user_id, Freshness::consistent()).await {
            Ok(read) => read.into_value(),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to load memberships");
                store.set_loading(false);
                return Err(e);
            }
        };
        store.load_memberships(organizations)?;
        Ok(())
    }
}
