//! Invalidation plans.
//!
//! Each mutation settles by invalidating a fixed set of key prefixes: every
//! view that can show data derived from what the mutation touched. The
//! builders here are pure so the fan-out of each mutation can be asserted
//! without a cache.

use stockroom_core::{MovementType, OrganizationId, ProductId, RestockItem, TechnicianId};

use super::key::CacheKey;
use super::registry::{
    CategoryKeys, DashboardKeys, EntityKeys, InventoryKeys, MovementKeys, NamespaceKeys,
    OrganizationKeys, ProductKeys, TechnicianKeys,
};

/// Ordered, duplicate-free set of prefixes to invalidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    prefixes: Vec<CacheKey>,
}

impl InvalidationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prefix, ignoring exact duplicates.
    pub fn with(mut self, prefix: CacheKey) -> Self {
        self.push(prefix);
        self
    }

    pub fn push(&mut self, prefix: CacheKey) {
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
    }

    pub fn prefixes(&self) -> &[CacheKey] {
        &self.prefixes
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Whether `prefix` is literally part of the plan.
    pub fn contains(&self, prefix: &CacheKey) -> bool {
        self.prefixes.contains(prefix)
    }

    /// Whether invalidating the plan reaches `key`.
    pub fn covers(&self, key: &CacheKey) -> bool {
        self.prefixes.iter().any(|prefix| prefix.is_prefix_of(key))
    }

    // ------------------------------------------------------------------------
    // Stock movements
    // ------------------------------------------------------------------------

    /// Views derived from the stock level of any product.
    fn stock_levels() -> Self {
        Self::new()
            .with(ProductKeys::lists())
            .with(ProductKeys::all_stats())
            .with(ProductKeys::all_low_stock())
    }

    fn stock_movement(product_id: ProductId) -> Self {
        Self::stock_levels()
            .with(ProductKeys::detail(product_id))
            .with(MovementKeys::lists())
            .with(MovementKeys::summaries())
            .with(MovementKeys::by_product(product_id))
            .with(DashboardKeys::all())
    }

    pub fn stock_entry(product_id: ProductId) -> Self {
        Self::stock_movement(product_id)
    }

    /// Technician exits also move stock into the technician's inventory.
    pub fn stock_exit(product_id: ProductId, movement_type: MovementType) -> Self {
        let plan = Self::stock_movement(product_id);
        if movement_type.touches_technician() {
            plan.with(TechnicianKeys::all())
                .with(InventoryKeys::all())
        } else {
            plan
        }
    }

    pub fn technician_restock(items: &[RestockItem]) -> Self {
        let mut plan = Self::new().with(TechnicianKeys::all());
        for prefix in Self::stock_levels().prefixes {
            plan.push(prefix);
        }
        for item in items {
            plan.push(ProductKeys::detail(item.product_id));
        }
        for item in items {
            plan.push(MovementKeys::by_product(item.product_id));
        }
        plan.with(MovementKeys::lists())
            .with(MovementKeys::summaries())
            .with(DashboardKeys::all())
            .with(InventoryKeys::all())
    }

    pub fn technician_inventory_add(items: &[RestockItem]) -> Self {
        Self::technician_restock(items)
    }

    // ------------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------------

    /// Thresholds feed the stats and low-stock views.
    pub fn product_update(product_id: ProductId) -> Self {
        Self::stock_levels()
            .with(ProductKeys::detail(product_id))
            .with(DashboardKeys::all())
    }

    pub fn product_delete() -> Self {
        Self::new()
            .with(ProductKeys::all())
            .with(DashboardKeys::all())
            .with(InventoryKeys::all())
    }

    pub fn category_create() -> Self {
        Self::new().with(CategoryKeys::all())
    }

    /// Product lists embed the category name.
    pub fn category_change() -> Self {
        Self::new()
            .with(CategoryKeys::all())
            .with(ProductKeys::lists())
    }

    // ------------------------------------------------------------------------
    // Technicians
    // ------------------------------------------------------------------------

    pub fn technician_update(_technician_id: TechnicianId) -> Self {
        Self::new().with(TechnicianKeys::all())
    }

    pub fn technician_delete() -> Self {
        Self::new()
            .with(TechnicianKeys::all())
            .with(InventoryKeys::all())
            .with(DashboardKeys::all())
    }

    // ------------------------------------------------------------------------
    // Organizations
    // ------------------------------------------------------------------------

    pub fn organization_change() -> Self {
        Self::new().with(OrganizationKeys::all())
    }

    pub fn member_change(organization_id: OrganizationId) -> Self {
        Self::new().with(OrganizationKeys::members(organization_id))
    }

    pub fn invitation_change(organization_id: OrganizationId) -> Self {
        Self::new().with(OrganizationKeys::invitations(organization_id))
    }
}

impl<'a> IntoIterator for &'a InvalidationPlan {
    type Item = &'a CacheKey;
    type IntoIter = std::slice::Iter<'a, CacheKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.prefixes.iter()
    }
}
