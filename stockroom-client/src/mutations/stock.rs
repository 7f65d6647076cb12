//! Stock movements and technician batches.

use stockroom_core::{
    InventoryBackend, MovementType, OrganizationId, ProductId, RestockOutcome, StockEntryRequest,
    StockExitRequest, StockMovement, StockroomResult, TechnicianId,
};
use stockroom_storage::{project_stock_delta, EntityKeys, InvalidationPlan, ProductKeys};

use super::{batch_items, positive, Mutations};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockEntryInput {
    pub organization_id: OrganizationId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockExitInput {
    pub organization_id: OrganizationId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub movement_type: MovementType,
    pub technician_id: Option<TechnicianId>,
    pub notes: Option<String>,
}

/// One product line of a technician batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnicianBatchInput {
    pub technician_id: TechnicianId,
    pub items: Vec<BatchLine>,
}

impl<B: InventoryBackend> Mutations<B> {
    /// Receive stock: the cached product shows `stock_current + quantity`
    /// until the backend answers.
    pub async fn create_stock_entry(&self, input: StockEntryInput) -> StockroomResult<StockMovement> {
        let quantity = positive("quantity", input.quantity)?;
        let request = StockEntryRequest {
            organization_id: input.organization_id,
            product_id: input.product_id,
            quantity,
            notes: input.notes,
        };

        let key = ProductKeys::detail(request.product_id);
        let delta = quantity.get();
        let patch = self
            .cache
            .begin_patch(&key, |value| project_stock_delta(value, delta))?;

        let plan = InvalidationPlan::stock_entry(request.product_id);
        self.settle(
            "create_stock_entry",
            patch.into_iter().collect(),
            plan,
            self.backend.create_stock_entry(&request),
        )
        .await
    }

    /// Issue stock: the cached product shows `stock_current - quantity`.
    ///
    /// The backend rejects exits exceeding the available stock; the
    /// projection is then rolled back.
    pub async fn create_stock_exit(&self, input: StockExitInput) -> StockroomResult<StockMovement> {
        let quantity = positive("quantity", input.quantity)?;
        let request = StockExitRequest {
            organization_id: input.organization_id,
            product_id: input.product_id,
            quantity,
            movement_type: input.movement_type,
            technician_id: input.technician_id,
            notes: input.notes,
        };

        let key = ProductKeys::detail(request.product_id);
        let delta = -quantity.get();
        let patch = self
            .cache
            .begin_patch(&key, |value| project_stock_delta(value, delta))?;

        let plan = InvalidationPlan::stock_exit(request.product_id, request.movement_type);
        self.settle(
            "create_stock_exit",
            patch.into_iter().collect(),
            plan,
            self.backend.create_stock_exit(&request),
        )
        .await
    }

    /// Replace a technician's inventory with the batch. All or nothing.
    pub async fn restock_technician(&self, input: TechnicianBatchInput) -> StockroomResult<RestockOutcome> {
        let items = batch_items(&input.items)?;
        let plan = InvalidationPlan::technician_restock(&items);
        tracing::debug!(
            technician_id = %input.technician_id,
            items = items.len(),
            "Restocking technician"
        );
        self.settle(
            "restock_technician",
            Vec::new(),
            plan,
            self.backend.restock_technician(input.technician_id, &items),
        )
        .await
    }

    /// Add the batch on top of a technician's inventory. All or nothing.
    pub async fn add_to_technician_inventory(
        &self,
        input: TechnicianBatchInput,
    ) -> StockroomResult<RestockOutcome> {
        let items = batch_items(&input.items)?;
        let plan = InvalidationPlan::technician_inventory_add(&items);
        self.settle(
            "add_to_technician_inventory",
            Vec::new(),
            plan,
            self.backend
                .add_to_technician_inventory(input.technician_id, &items),
        )
        .await
    }
}
