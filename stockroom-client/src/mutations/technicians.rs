use stockroom_core::{
    EntityIdType, InventoryBackend, StockroomResult, Technician, TechnicianId, TechnicianUpdate,
};
use stockroom_storage::{
    remove_from_list, shallow_merge, EntityKeys, InvalidationPlan, TechnicianKeys,
};

use super::{edited_fields, required_edit, Mutations};

impl<B: InventoryBackend> Mutations<B> {
    pub async fn update_technician(
        &self,
        technician_id: TechnicianId,
        update: TechnicianUpdate,
    ) -> StockroomResult<Technician> {
        let update = TechnicianUpdate {
            first_name: required_edit("first_name", update.first_name)?,
            last_name: required_edit("last_name", update.last_name)?,
            ..update
        };
        let key = TechnicianKeys::detail(technician_id);
        let fields = edited_fields(&key, &update)?;
        let patch = self
            .cache
            .begin_patch(&key, |value| shallow_merge(value, &fields))?;

        self.settle(
            "update_technician",
            patch.into_iter().collect(),
            InvalidationPlan::technician_update(technician_id),
            self.backend.update_technician(technician_id, &update),
        )
        .await
    }

    /// Delete a technician; it disappears from every cached technician list.
    pub async fn delete_technician(&self, technician_id: TechnicianId) -> StockroomResult<()> {
        let id = technician_id.as_uuid().to_string();
        let patches = self
            .cache
            .begin_patches_under(&TechnicianKeys::lists(), |value| remove_from_list(value, &id))?;

        self.settle(
            "delete_technician",
            patches,
            InvalidationPlan::technician_delete(),
            self.backend.delete_technician(technician_id),
        )
        .await
    }
}
