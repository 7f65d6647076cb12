//! Products and categories.

use stockroom_core::{
    Category, CategoryId, CategoryUpdate, EntityIdType, InventoryBackend, NewCategory, Product,
    ProductId, ProductUpdate, StockroomResult,
};
use stockroom_storage::{
    remove_from_list, shallow_merge, CategoryKeys, EntityKeys, InvalidationPlan, ProductKeys,
};

use super::{edited_fields, required, required_edit, Mutations};

impl<B: InventoryBackend> Mutations<B> {
    /// Edit product fields; the cached detail shows the merged fields
    /// until the backend answers.
    pub async fn update_product(
        &self,
        product_id: ProductId,
        update: ProductUpdate,
    ) -> StockroomResult<Product> {
        let update = ProductUpdate {
            name: required_edit("name", update.name)?,
            ..update
        };
        let key = ProductKeys::detail(product_id);
        let fields = edited_fields(&key, &update)?;
        let patch = self
            .cache
            .begin_patch(&key, |value| shallow_merge(value, &fields))?;

        self.settle(
            "update_product",
            patch.into_iter().collect(),
            InvalidationPlan::product_update(product_id),
            self.backend.update_product(product_id, &update),
        )
        .await
    }

    /// Delete a product; it disappears from every cached product list.
    pub async fn delete_product(&self, product_id: ProductId) -> StockroomResult<()> {
        let id = product_id.as_uuid().to_string();
        let patches = self
            .cache
            .begin_patches_under(&ProductKeys::lists(), |value| remove_from_list(value, &id))?;

        self.settle(
            "delete_product",
            patches,
            InvalidationPlan::product_delete(),
            self.backend.delete_product(product_id),
        )
        .await
    }

    pub async fn create_category(&self, category: NewCategory) -> StockroomResult<Category> {
        let category = NewCategory {
            name: required("name", &category.name)?,
            ..category
        };
        self.settle(
            "create_category",
            Vec::new(),
            InvalidationPlan::category_create(),
            self.backend.create_category(&category),
        )
        .await
    }

    pub async fn update_category(
        &self,
        category_id: CategoryId,
        update: CategoryUpdate,
    ) -> StockroomResult<Category> {
        let update = CategoryUpdate {
            name: required_edit("name", update.name)?,
            ..update
        };
        self.settle(
            "update_category",
            Vec::new(),
            InvalidationPlan::category_change(),
            self.backend.update_category(category_id, &update),
        )
        .await
    }

    /// Delete a category; it disappears from every cached category list.
    pub async fn delete_category(&self, category_id: CategoryId) -> StockroomResult<()> {
        let id = category_id.as_uuid().to_string();
        let patches = self
            .cache
            .begin_patches_under(&CategoryKeys::lists(), |value| remove_from_list(value, &id))?;

        self.settle(
            "delete_category",
            patches,
            InvalidationPlan::category_change(),
            self.backend.delete_category(category_id),
        )
        .await
    }
}
