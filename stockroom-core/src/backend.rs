//! Remote call surface consumed by the consistency layer.
//!
//! The backend owns every invariant that needs a serialization point: stock
//! never goes negative, batches apply atomically, a technician exit requires
//! a technician. Implementations report violations as [`RemoteError`]s whose
//! message text identifies the failure (see [`RemoteError::kind`]).
//!
//! [`RemoteError`]: crate::RemoteError
//! [`RemoteError::kind`]: crate::RemoteError::kind

use serde::{Deserialize, Serialize};

use crate::{
    Category, CategoryId, CategoryUpdate, Invitation, InvitationId, MemberId, MemberRole,
    MovementType, NewCategory, NewOrganization, Organization, OrganizationId, OrganizationMember,
    OrganizationUpdate, Product, ProductId, ProductUpdate, Quantity, RestockItem, RestockOutcome,
    StockMovement, StockroomResult, Technician, TechnicianId, TechnicianUpdate, UserId,
};

/// Validated stock entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntryRequest {
    pub organization_id: OrganizationId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub notes: Option<String>,
}

/// Validated stock exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockExitRequest {
    pub organization_id: OrganizationId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub movement_type: MovementType,
    /// Required by the backend when `movement_type` is `ExitTechnician`.
    pub technician_id: Option<TechnicianId>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationRequest {
    pub organization_id: OrganizationId,
    pub email: String,
    pub role: MemberRole,
}

/// Remote operations of the inventory backend.
///
/// Every method is one round-trip; nothing is retried here.
#[async_trait::async_trait]
pub trait InventoryBackend: Send + Sync {
    // === Stock movements (atomic server-side) ===

    /// Increment stock and record the movement.
    async fn create_stock_entry(&self, request: &StockEntryRequest) -> StockroomResult<StockMovement>;

    /// Check stock, decrement it and record the movement. Technician exits
    /// also credit the technician's inventory line.
    async fn create_stock_exit(&self, request: &StockExitRequest) -> StockroomResult<StockMovement>;

    /// Move a batch from central stock into a technician's inventory.
    /// Either every line applies or none does.
    async fn restock_technician(
        &self,
        technician_id: TechnicianId,
        items: &[RestockItem],
    ) -> StockroomResult<RestockOutcome>;

    /// Same contract as [`restock_technician`](Self::restock_technician),
    /// adding to the existing lines instead of replacing the restock.
    async fn add_to_technician_inventory(
        &self,
        technician_id: TechnicianId,
        items: &[RestockItem],
    ) -> StockroomResult<RestockOutcome>;

    // === Products ===

    async fn fetch_product(&self, product_id: ProductId) -> StockroomResult<Product>;

    async fn update_product(
        &self,
        product_id: ProductId,
        update: &ProductUpdate,
    ) -> StockroomResult<Product>;

    async fn delete_product(&self, product_id: ProductId) -> StockroomResult<()>;

    // === Technicians ===

    async fn update_technician(
        &self,
        technician_id: TechnicianId,
        update: &TechnicianUpdate,
    ) -> StockroomResult<Technician>;

    async fn delete_technician(&self, technician_id: TechnicianId) -> StockroomResult<()>;

    // === Categories ===

    async fn create_category(&self, category: &NewCategory) -> StockroomResult<Category>;

    async fn update_category(
        &self,
        category_id: CategoryId,
        update: &CategoryUpdate,
    ) -> StockroomResult<Category>;

    async fn delete_category(&self, category_id: CategoryId) -> StockroomResult<()>;

    // === Organizations ===

    async fn create_organization(
        &self,
        organization: &NewOrganization,
    ) -> StockroomResult<Organization>;

    async fn update_organization(
        &self,
        organization_id: OrganizationId,
        update: &OrganizationUpdate,
    ) -> StockroomResult<Organization>;

    async fn delete_organization(&self, organization_id: OrganizationId) -> StockroomResult<()>;

    /// Organizations the user is a member of.
    async fn list_memberships(&self, user_id: UserId) -> StockroomResult<Vec<Organization>>;

    // === Members and invitations ===

    async fn invite_member(&self, request: &InvitationRequest) -> StockroomResult<Invitation>;

    async fn update_member_role(
        &self,
        member_id: MemberId,
        role: MemberRole,
    ) -> StockroomResult<OrganizationMember>;

    async fn remove_member(&self, member_id: MemberId) -> StockroomResult<()>;

    async fn revoke_invitation(&self, invitation_id: InvitationId) -> StockroomResult<()>;
}
