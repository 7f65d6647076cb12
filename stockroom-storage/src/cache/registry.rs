//! Cache key registry.
//!
//! Pure key factories for every namespace. Collection keys extend
//! `lists()`, single-entity keys extend `details()`, and every specialized
//! key extends its namespace root, so invalidating a parent always reaches
//! its descendants.

use stockroom_core::{
    CategoryId, EntityIdType, MovementId, MovementType, OrganizationId, ProductId, TechnicianId,
    UserId,
};

use super::key::{CacheKey, KeySegment, Namespace};

/// Keys shared by every namespace.
pub trait NamespaceKeys {
    const NAMESPACE: Namespace;

    /// Root key of the namespace.
    fn all() -> CacheKey {
        CacheKey::root(Self::NAMESPACE)
    }
}

/// Keys for namespaces holding addressable entities.
pub trait EntityKeys: NamespaceKeys {
    type Id: EntityIdType;

    fn lists() -> CacheKey {
        Self::all().child(KeySegment::tag("list"))
    }

    fn details() -> CacheKey {
        Self::all().child(KeySegment::tag("detail"))
    }

    fn detail(id: Self::Id) -> CacheKey {
        Self::details().child(KeySegment::id(id))
    }
}

/// Filters of the product catalog screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilters {
    pub organization_id: Option<OrganizationId>,
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub low_stock_only: bool,
}

impl ProductFilters {
    pub fn for_organization(organization_id: OrganizationId) -> Self {
        Self {
            organization_id: Some(organization_id),
            ..Default::default()
        }
    }

    fn to_segment(&self) -> KeySegment {
        KeySegment::Params(vec![
            ("organization_id", KeySegment::opt_id(self.organization_id)),
            ("category_id", KeySegment::opt_id(self.category_id)),
            ("search", KeySegment::opt_text(self.search.as_deref())),
            ("low_stock_only", KeySegment::Bool(self.low_stock_only)),
        ])
    }
}

/// Filters of the movement history screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilters {
    pub organization_id: Option<OrganizationId>,
    pub product_id: Option<ProductId>,
    pub technician_id: Option<TechnicianId>,
    pub movement_type: Option<MovementType>,
    pub limit: Option<i64>,
}

impl MovementFilters {
    fn to_segment(&self) -> KeySegment {
        KeySegment::Params(vec![
            ("organization_id", KeySegment::opt_id(self.organization_id)),
            ("product_id", KeySegment::opt_id(self.product_id)),
            ("technician_id", KeySegment::opt_id(self.technician_id)),
            (
                "movement_type",
                KeySegment::opt_movement_type(self.movement_type),
            ),
            ("limit", KeySegment::opt_int(self.limit)),
        ])
    }
}

// ============================================================================
// PRODUCTS
// ============================================================================

pub struct ProductKeys;

impl NamespaceKeys for ProductKeys {
    const NAMESPACE: Namespace = Namespace::Products;
}

impl EntityKeys for ProductKeys {
    type Id = ProductId;
}

impl ProductKeys {
    pub fn list(filters: &ProductFilters) -> CacheKey {
        Self::lists().child(filters.to_segment())
    }

    /// Prefix of every stock statistics key.
    pub fn all_stats() -> CacheKey {
        Self::all().child(KeySegment::tag("stats"))
    }

    pub fn stats(organization_id: Option<OrganizationId>) -> CacheKey {
        Self::all_stats().child(KeySegment::opt_id(organization_id))
    }

    /// Prefix of every low-stock listing.
    pub fn all_low_stock() -> CacheKey {
        Self::all().child(KeySegment::tag("low-stock"))
    }

    pub fn low_stock(organization_id: Option<OrganizationId>) -> CacheKey {
        Self::all_low_stock().child(KeySegment::opt_id(organization_id))
    }
}

// ============================================================================
// CATEGORIES
// ============================================================================

pub struct CategoryKeys;

impl NamespaceKeys for CategoryKeys {
    const NAMESPACE: Namespace = Namespace::Categories;
}

impl EntityKeys for CategoryKeys {
    type Id = CategoryId;
}

impl CategoryKeys {
    pub fn list(organization_id: Option<OrganizationId>) -> CacheKey {
        Self::lists().child(KeySegment::opt_id(organization_id))
    }
}

// ============================================================================
// MOVEMENTS
// ============================================================================

pub struct MovementKeys;

impl NamespaceKeys for MovementKeys {
    const NAMESPACE: Namespace = Namespace::Movements;
}

impl EntityKeys for MovementKeys {
    type Id = MovementId;
}

impl MovementKeys {
    pub fn list(filters: &MovementFilters) -> CacheKey {
        Self::lists().child(filters.to_segment())
    }

    /// Prefix of every summary key.
    pub fn summaries() -> CacheKey {
        Self::all().child(KeySegment::tag("summary"))
    }

    pub fn summary(organization_id: Option<OrganizationId>) -> CacheKey {
        Self::summaries().child(KeySegment::opt_id(organization_id))
    }

    pub fn by_product(product_id: ProductId) -> CacheKey {
        Self::all()
            .child(KeySegment::tag("by-product"))
            .child(KeySegment::id(product_id))
    }
}

// ============================================================================
// TECHNICIANS
// ============================================================================

pub struct TechnicianKeys;

impl NamespaceKeys for TechnicianKeys {
    const NAMESPACE: Namespace = Namespace::Technicians;
}

impl EntityKeys for TechnicianKeys {
    type Id = TechnicianId;
}

impl TechnicianKeys {
    pub fn list(organization_id: Option<OrganizationId>) -> CacheKey {
        Self::lists().child(KeySegment::opt_id(organization_id))
    }

    /// Personal inventory lines of one technician.
    pub fn inventory(technician_id: TechnicianId) -> CacheKey {
        Self::all()
            .child(KeySegment::tag("inventory"))
            .child(KeySegment::id(technician_id))
    }

    /// Movement history of one technician.
    pub fn history(technician_id: TechnicianId) -> CacheKey {
        Self::all()
            .child(KeySegment::tag("history"))
            .child(KeySegment::id(technician_id))
    }
}

// ============================================================================
// DASHBOARD
// ============================================================================

pub struct DashboardKeys;

impl NamespaceKeys for DashboardKeys {
    const NAMESPACE: Namespace = Namespace::Dashboard;
}

impl DashboardKeys {
    pub fn stats(organization_id: Option<OrganizationId>) -> CacheKey {
        Self::all()
            .child(KeySegment::tag("stats"))
            .child(KeySegment::opt_id(organization_id))
    }

    pub fn trends(organization_id: Option<OrganizationId>, period_days: i64) -> CacheKey {
        Self::all()
            .child(KeySegment::tag("trends"))
            .child(KeySegment::opt_id(organization_id))
            .child(KeySegment::Int(period_days))
    }

    pub fn alerts(organization_id: Option<OrganizationId>) -> CacheKey {
        Self::all()
            .child(KeySegment::tag("alerts"))
            .child(KeySegment::opt_id(organization_id))
    }
}

// ============================================================================
// ORGANIZATIONS
// ============================================================================

pub struct OrganizationKeys;

impl NamespaceKeys for OrganizationKeys {
    const NAMESPACE: Namespace = Namespace::Organizations;
}

impl EntityKeys for OrganizationKeys {
    type Id = OrganizationId;
}

impl OrganizationKeys {
    /// Organizations the given user belongs to.
    pub fn list(user_id: Option<UserId>) -> CacheKey {
        Self::lists().child(KeySegment::opt_id(user_id))
    }

    pub fn members(organization_id: OrganizationId) -> CacheKey {
        Self::all()
            .child(KeySegment::tag("members"))
            .child(KeySegment::id(organization_id))
    }

    pub fn invitations(organization_id: OrganizationId) -> CacheKey {
        Self::all()
            .child(KeySegment::tag("invitations"))
            .child(KeySegment::id(organization_id))
    }
}

// ============================================================================
// INVENTORY
// ============================================================================

pub struct InventoryKeys;

impl NamespaceKeys for InventoryKeys {
    const NAMESPACE: Namespace = Namespace::Inventory;
}

impl InventoryKeys {
    pub fn by_technician(technician_id: TechnicianId) -> CacheKey {
        Self::all()
            .child(KeySegment::tag("technician"))
            .child(KeySegment::id(technician_id))
    }

    pub fn summary(organization_id: Option<OrganizationId>) -> CacheKey {
        Self::all()
            .child(KeySegment::tag("summary"))
            .child(KeySegment::opt_id(organization_id))
    }
}
