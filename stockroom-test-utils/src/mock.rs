//! In-memory inventory backend.
//!
//! Applies the same atomic rules as the real RPCs (no negative stock,
//! all-or-nothing batches, technician required for technician exits) and
//! fails with the same French messages, so error classification can be
//! exercised end to end. Every call is recorded before anything else
//! happens, which lets tests assert that invalid input never reached the
//! backend.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use stockroom_core::{
    Category, CategoryId, CategoryUpdate, EntityIdType, InventoryBackend, Invitation,
    InvitationId, InvitationRequest, InvitationStatus, MemberId, MemberRole, MovementId,
    MovementType, NewCategory, NewOrganization, Organization, OrganizationId, OrganizationMember,
    OrganizationUpdate, Product, ProductId, ProductUpdate, RemoteError, RestockItem,
    RestockOutcome, StockEntryRequest, StockExitRequest, StockMovement, StockroomResult,
    Technician, TechnicianId, TechnicianUpdate, UserId,
};
use tokio::sync::{mpsc, Semaphore};

pub const MISSING_TECHNICIAN_MESSAGE: &str = "Technicien requis pour une sortie technicien";

#[derive(Debug, Default)]
struct MockState {
    products: HashMap<ProductId, Product>,
    technicians: HashMap<TechnicianId, Technician>,
    technician_inventory: HashMap<(TechnicianId, ProductId), i64>,
    categories: HashMap<CategoryId, Category>,
    organizations: HashMap<OrganizationId, Organization>,
    memberships: HashMap<UserId, Vec<OrganizationId>>,
    members: HashMap<MemberId, OrganizationMember>,
    invitations: HashMap<InvitationId, Invitation>,
    movements: Vec<StockMovement>,
}

#[derive(Debug)]
struct Gate {
    permits: Arc<Semaphore>,
    started: mpsc::UnboundedSender<&'static str>,
}

/// Test-side handle of a gated backend.
///
/// Each backend call announces itself on the started channel, then waits
/// for a permit. Permits are handed out in arrival order.
#[derive(Debug)]
pub struct GateController {
    permits: Arc<Semaphore>,
    started: mpsc::UnboundedReceiver<&'static str>,
}

impl GateController {
    /// Let `n` waiting (or future) calls proceed.
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Wait until the next call reaches the gate; returns its name.
    pub async fn next_started(&mut self) -> Option<&'static str> {
        self.started.recv().await
    }
}

/// Mock backend for testing.
#[derive(Debug, Default)]
pub struct MockInventoryBackend {
    state: Mutex<MockState>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, VecDeque<RemoteError>>>,
    gate: Option<Gate>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::new(format!("{} introuvable", what)).with_status(404)
}

fn insufficient_stock(product: &Product, requested: i64) -> RemoteError {
    RemoteError::new(format!(
        "Stock insuffisant pour le produit {} (disponible: {}, demandé: {})",
        product.name, product.stock_current, requested
    ))
    .with_code("P0001")
    .with_status(400)
}

impl MockInventoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose calls block until the controller releases them.
    pub fn gated() -> (Self, GateController) {
        let permits = Arc::new(Semaphore::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Self {
            gate: Some(Gate {
                permits: permits.clone(),
                started: tx,
            }),
            ..Self::default()
        };
        (
            backend,
            GateController {
                permits,
                started: rx,
            },
        )
    }

    // ------------------------------------------------------------------------
    // Seeding and inspection
    // ------------------------------------------------------------------------

    pub fn with_product(self, product: Product) -> Self {
        self.insert_product(product);
        self
    }

    pub fn insert_product(&self, product: Product) {
        lock(&self.state).products.insert(product.id, product);
    }

    pub fn insert_technician(&self, technician: Technician) {
        lock(&self.state).technicians.insert(technician.id, technician);
    }

    pub fn insert_category(&self, category: Category) {
        lock(&self.state).categories.insert(category.id, category);
    }

    pub fn insert_organization(&self, organization: Organization) {
        lock(&self.state)
            .organizations
            .insert(organization.id, organization);
    }

    pub fn add_membership(&self, user_id: UserId, organization_id: OrganizationId) {
        lock(&self.state)
            .memberships
            .entry(user_id)
            .or_default()
            .push(organization_id);
    }

    pub fn insert_member(&self, member: OrganizationMember) {
        lock(&self.state).members.insert(member.id, member);
    }

    pub fn product(&self, product_id: ProductId) -> Option<Product> {
        lock(&self.state).products.get(&product_id).cloned()
    }

    pub fn stock_of(&self, product_id: ProductId) -> Option<i64> {
        lock(&self.state)
            .products
            .get(&product_id)
            .map(|p| p.stock_current)
    }

    pub fn technician_stock(&self, technician_id: TechnicianId, product_id: ProductId) -> i64 {
        lock(&self.state)
            .technician_inventory
            .get(&(technician_id, product_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn movements(&self) -> Vec<StockMovement> {
        lock(&self.state).movements.clone()
    }

    pub fn invitation(&self, invitation_id: InvitationId) -> Option<Invitation> {
        lock(&self.state).invitations.get(&invitation_id).cloned()
    }

    /// Names of every call received, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        lock(&self.calls).iter().filter(|c| **c == call).count()
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Make the next `call` fail with `error` instead of touching state.
    /// Injected failures are consumed after the gate.
    pub fn fail_next(&self, call: &'static str, error: RemoteError) {
        lock(&self.failures)
            .entry(call)
            .or_default()
            .push_back(error);
    }

    async fn enter(&self, call: &'static str) -> StockroomResult<()> {
        lock(&self.calls).push(call);
        if let Some(gate) = &self.gate {
            let _ = gate.started.send(call);
            let permit = gate
                .permits
                .acquire()
                .await
                .map_err(|_| RemoteError::transport("gate closed"))?;
            permit.forget();
        }
        let injected = lock(&self.failures)
            .get_mut(call)
            .and_then(VecDeque::pop_front);
        match injected {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    fn apply_batch(
        &self,
        technician_id: TechnicianId,
        items: &[RestockItem],
    ) -> StockroomResult<RestockOutcome> {
        let mut state = lock(&self.state);
        if !state.technicians.contains_key(&technician_id) {
            return Err(not_found("Technicien").into());
        }

        let mut requested: HashMap<ProductId, i64> = HashMap::new();
        for item in items {
            *requested.entry(item.product_id).or_default() += item.quantity.get();
        }
        for (product_id, quantity) in &requested {
            let product = state
                .products
                .get(product_id)
                .ok_or_else(|| not_found("Produit"))?;
            if product.stock_current < *quantity {
                return Err(insufficient_stock(product, *quantity).into());
            }
        }

        let previous_items_count = state
            .technician_inventory
            .keys()
            .filter(|(tech, _)| *tech == technician_id)
            .count() as i64;
        let now = Utc::now();
        for (product_id, quantity) in requested {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.stock_current -= quantity;
                product.updated_at = now;
            }
            *state
                .technician_inventory
                .entry((technician_id, product_id))
                .or_default() += quantity;
        }
        let items_count = state
            .technician_inventory
            .keys()
            .filter(|(tech, _)| *tech == technician_id)
            .count() as i64;

        Ok(RestockOutcome {
            success: true,
            items_count,
            previous_items_count,
        })
    }
}

#[async_trait]
impl InventoryBackend for MockInventoryBackend {
    async fn create_stock_entry(&self, request: &StockEntryRequest) -> StockroomResult<StockMovement> {
        self.enter("create_stock_entry").await?;
        let mut state = lock(&self.state);
        let now = Utc::now();
        let product = state
            .products
            .get_mut(&request.product_id)
            .ok_or_else(|| not_found("Produit"))?;
        product.stock_current += request.quantity.get();
        product.updated_at = now;

        let movement = StockMovement {
            id: MovementId::now_v7(),
            product_id: request.product_id,
            quantity: request.quantity,
            movement_type: MovementType::Entry,
            technician_id: None,
            notes: request.notes.clone(),
            organization_id: request.organization_id,
            created_at: now,
        };
        state.movements.push(movement.clone());
        Ok(movement)
    }

    async fn create_stock_exit(&self, request: &StockExitRequest) -> StockroomResult<StockMovement> {
        self.enter("create_stock_exit").await?;
        let mut state = lock(&self.state);
        let quantity = request.quantity.get();

        let technician_id = match (request.movement_type, request.technician_id) {
            (MovementType::ExitTechnician, None) => {
                return Err(RemoteError::new(MISSING_TECHNICIAN_MESSAGE)
                    .with_status(400)
                    .into())
            }
            (MovementType::ExitTechnician, Some(id)) => Some(id),
            _ => None,
        };

        let product = state
            .products
            .get(&request.product_id)
            .ok_or_else(|| not_found("Produit"))?;
        if product.stock_current < quantity {
            return Err(insufficient_stock(product, quantity).into());
        }

        let now = Utc::now();
        if let Some(product) = state.products.get_mut(&request.product_id) {
            product.stock_current -= quantity;
            product.updated_at = now;
        }
        if let Some(technician_id) = technician_id {
            *state
                .technician_inventory
                .entry((technician_id, request.product_id))
                .or_default() += quantity;
        }

        let movement = StockMovement {
            id: MovementId::now_v7(),
            product_id: request.product_id,
            quantity: request.quantity,
            movement_type: request.movement_type,
            technician_id: request.technician_id,
            notes: request.notes.clone(),
            organization_id: request.organization_id,
            created_at: now,
        };
        state.movements.push(movement.clone());
        Ok(movement)
    }

    async fn restock_technician(
        &self,
        technician_id: TechnicianId,
        items: &[RestockItem],
    ) -> StockroomResult<RestockOutcome> {
        self.enter("restock_technician").await?;
        self.apply_batch(technician_id, items)
    }

    async fn add_to_technician_inventory(
        &self,
        technician_id: TechnicianId,
        items: &[RestockItem],
    ) -> StockroomResult<RestockOutcome> {
        self.enter("add_to_technician_inventory").await?;
        self.apply_batch(technician_id, items)
    }

    async fn fetch_product(&self, product_id: ProductId) -> StockroomResult<Product> {
        self.enter("fetch_product").await?;
        self.product(product_id)
            .ok_or_else(|| not_found("Produit").into())
    }

    async fn update_product(
        &self,
        product_id: ProductId,
        update: &ProductUpdate,
    ) -> StockroomResult<Product> {
        self.enter("update_product").await?;
        let mut state = lock(&self.state);
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or_else(|| not_found("Produit"))?;
        if let Some(name) = &update.name {
            product.name = name.clone();
        }
        if let Some(reference) = &update.reference {
            product.reference = Some(reference.clone());
        }
        if let Some(category_id) = update.category_id {
            product.category_id = Some(category_id);
        }
        if let Some(stock_min) = update.stock_min {
            product.stock_min = stock_min;
        }
        if let Some(stock_max) = update.stock_max {
            product.stock_max = stock_max;
        }
        if let Some(unit_price) = update.unit_price {
            product.unit_price = Some(unit_price);
        }
        if let Some(image_url) = &update.image_url {
            product.image_url = Some(image_url.clone());
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&self, product_id: ProductId) -> StockroomResult<()> {
        self.enter("delete_product").await?;
        let mut state = lock(&self.state);
        state
            .products
            .remove(&product_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Produit").into())
    }

    async fn update_technician(
        &self,
        technician_id: TechnicianId,
        update: &TechnicianUpdate,
    ) -> StockroomResult<Technician> {
        self.enter("update_technician").await?;
        let mut state = lock(&self.state);
        let technician = state
            .technicians
            .get_mut(&technician_id)
            .ok_or_else(|| not_found("Technicien"))?;
        if let Some(first_name) = &update.first_name {
            technician.first_name = first_name.clone();
        }
        if let Some(last_name) = &update.last_name {
            technician.last_name = last_name.clone();
        }
        if let Some(email) = &update.email {
            technician.email = Some(email.clone());
        }
        if let Some(phone) = &update.phone {
            technician.phone = Some(phone.clone());
        }
        if let Some(is_active) = update.is_active {
            technician.is_active = is_active;
        }
        Ok(technician.clone())
    }

    async fn delete_technician(&self, technician_id: TechnicianId) -> StockroomResult<()> {
        self.enter("delete_technician").await?;
        let mut state = lock(&self.state);
        state.technicians.remove(&technician_id).ok_or_else(|| not_found("Technicien"))?;
        state
            .technician_inventory
            .retain(|(tech, _), _| *tech != technician_id);
        Ok(())
    }

    async fn create_category(&self, category: &NewCategory) -> StockroomResult<Category> {
        self.enter("create_category").await?;
        let created = Category {
            id: CategoryId::now_v7(),
            organization_id: category.organization_id,
            name: category.name.clone(),
            description: category.description.clone(),
            created_at: Utc::now(),
        };
        lock(&self.state)
            .categories
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_category(
        &self,
        category_id: CategoryId,
        update: &CategoryUpdate,
    ) -> StockroomResult<Category> {
        self.enter("update_category").await?;
        let mut state = lock(&self.state);
        let category = state
            .categories
            .get_mut(&category_id)
            .ok_or_else(|| not_found("Catégorie"))?;
        if let Some(name) = &update.name {
            category.name = name.clone();
        }
        if let Some(description) = &update.description {
            category.description = Some(description.clone());
        }
        Ok(category.clone())
    }

    async fn delete_category(&self, category_id: CategoryId) -> StockroomResult<()> {
        self.enter("delete_category").await?;
        let mut state = lock(&self.state);
        state
            .categories
            .remove(&category_id)
            .ok_or_else(|| not_found("Catégorie"))?;
        for product in state.products.values_mut() {
            if product.category_id == Some(category_id) {
                product.category_id = None;
            }
        }
        Ok(())
    }

    async fn create_organization(
        &self,
        organization: &NewOrganization,
    ) -> StockroomResult<Organization> {
        self.enter("create_organization").await?;
        let created = Organization {
            id: OrganizationId::now_v7(),
            name: organization.name.clone(),
            slug: organization.slug.clone(),
            logo_url: None,
            created_at: Utc::now(),
        };
        lock(&self.state)
            .organizations
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_organization(
        &self,
        organization_id: OrganizationId,
        update: &OrganizationUpdate,
    ) -> StockroomResult<Organization> {
        self.enter("update_organization").await?;
        let mut state = lock(&self.state);
        let organization = state
            .organizations
            .get_mut(&organization_id)
            .ok_or_else(|| not_found("Organisation"))?;
        if let Some(name) = &update.name {
            organization.name = name.clone();
        }
        if let Some(slug) = &update.slug {
            organization.slug = Some(slug.clone());
        }
        if let Some(logo_url) = &update.logo_url {
            organization.logo_url = Some(logo_url.clone());
        }
        Ok(organization.clone())
    }

    async fn delete_organization(&self, organization_id: OrganizationId) -> StockroomResult<()> {
        self.enter("delete_organization").await?;
        let mut state = lock(&self.state);
        state
            .organizations
            .remove(&organization_id)
            .ok_or_else(|| not_found("Organisation"))?;
        for organizations in state.memberships.values_mut() {
            organizations.retain(|id| *id != organization_id);
        }
        Ok(())
    }

    async fn list_memberships(&self, user_id: UserId) -> StockroomResult<Vec<Organization>> {
        self.enter("list_memberships").await?;
        let state = lock(&self.state);
        let organizations: Vec<Organization> = state
            .memberships
            .get(&user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.organizations.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(organizations)
    }

    async fn invite_member(&self, request: &InvitationRequest) -> StockroomResult<Invitation> {
        self.enter("invite_member").await?;
        let mut state = lock(&self.state);
        let email = request.email.to_lowercase();
        let already_member = state.members.values().any(|m| {
            m.organization_id == request.organization_id && m.email.to_lowercase() == email
        });
        let already_invited = state.invitations.values().any(|i| {
            i.organization_id == request.organization_id
                && i.status == InvitationStatus::Pending
                && i.email.to_lowercase() == email
        });
        if already_member || already_invited {
            return Err(RemoteError::new("Une invitation existe déjà pour cet email")
                .with_code("23505")
                .with_status(409)
                .into());
        }

        let invitation = Invitation {
            id: InvitationId::now_v7(),
            organization_id: request.organization_id,
            email: request.email.clone(),
            role: request.role,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
        };
        state.invitations.insert(invitation.id, invitation.clone());
        Ok(invitation)
    }

    async fn update_member_role(
        &self,
        member_id: MemberId,
        role: MemberRole,
    ) -> StockroomResult<OrganizationMember> {
        self.enter("update_member_role").await?;
        let mut state = lock(&self.state);
        let member = state
            .members
            .get_mut(&member_id)
            .ok_or_else(|| not_found("Membre"))?;
        member.role = role;
        Ok(member.clone())
    }

    async fn remove_member(&self, member_id: MemberId) -> StockroomResult<()> {
        self.enter("remove_member").await?;
        lock(&self.state)
            .members
            .remove(&member_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Membre").into())
    }

    async fn revoke_invitation(&self, invitation_id: InvitationId) -> StockroomResult<()> {
        self.enter("revoke_invitation").await?;
        let mut state = lock(&self.state);
        let invitation = state
            .invitations
            .get_mut(&invitation_id)
            .ok_or_else(|| not_found("Invitation"))?;
        invitation.status = InvitationStatus::Revoked;
        Ok(())
    }
}
