//! Stockroom Test Utilities
//!
//! Centralized test infrastructure for the Stockroom workspace:
//! - In-memory mock backend with call recording, failure injection and gating
//! - Proptest generators for ids, quantities and movement inputs
//! - Test fixtures for common scenarios
//! - Custom assertions for error classification

pub mod mock;

pub use mock::{GateController, MockInventoryBackend, MISSING_TECHNICIAN_MESSAGE};

// Re-export core types for convenience
pub use stockroom_core::{
    Category, CategoryId, EntityIdType, ManualClock, MemberId, MemberRole, MovementType,
    Organization, OrganizationId, OrganizationMember, Product, ProductId, Quantity, RemoteError,
    RemoteErrorKind, RestockItem, StockroomError, StockroomResult, Technician, TechnicianId,
    UserId,
};

// ============================================================================
// GENERATORS
// ============================================================================

/// Proptest strategies.
pub mod generators {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_product_id() -> impl Strategy<Value = ProductId> {
        arb_uuid().prop_map(ProductId::new)
    }

    pub fn arb_organization_id() -> impl Strategy<Value = OrganizationId> {
        arb_uuid().prop_map(OrganizationId::new)
    }

    pub fn arb_technician_id() -> impl Strategy<Value = TechnicianId> {
        arb_uuid().prop_map(TechnicianId::new)
    }

    /// Quantities the backend accepts.
    pub fn arb_quantity() -> impl Strategy<Value = i64> {
        1i64..10_000
    }

    /// Quantities rejected before any remote call.
    pub fn arb_non_positive_quantity() -> impl Strategy<Value = i64> {
        prop_oneof![Just(0i64), Just(i64::MIN), -10_000i64..0]
    }

    pub fn arb_movement_type() -> impl Strategy<Value = MovementType> {
        prop_oneof![
            Just(MovementType::Entry),
            Just(MovementType::ExitTechnician),
            Just(MovementType::ExitAnonymous),
            Just(MovementType::ExitLoss),
        ]
    }

    pub fn arb_exit_type() -> impl Strategy<Value = MovementType> {
        prop_oneof![
            Just(MovementType::ExitTechnician),
            Just(MovementType::ExitAnonymous),
            Just(MovementType::ExitLoss),
        ]
    }

    pub fn arb_restock_item() -> impl Strategy<Value = RestockItem> {
        (arb_product_id(), 1i64..100).prop_filter_map("positive quantity", |(product_id, q)| {
            Quantity::new(q)
                .ok()
                .map(|quantity| RestockItem {
                    product_id,
                    quantity,
                })
        })
    }

    pub fn arb_restock_batch() -> impl Strategy<Value = Vec<RestockItem>> {
        prop::collection::vec(arb_restock_item(), 1..6)
    }

    /// Stock bounds `(current, min, max)` with `0 <= min <= max`.
    pub fn arb_stock_levels() -> impl Strategy<Value = (i64, i64, i64)> {
        (0i64..500, 0i64..200, 0i64..300)
            .prop_map(|(current, a, b)| (current, a.min(b), a.max(b)))
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Ready-made records.
pub mod fixtures {
    use super::*;
    use chrono::Utc;
    use serde_json::Value;
    use std::sync::Arc;
    use stockroom_storage::{EntityKeys, ProductKeys, QueryCache};

    /// A product with `stock_min = 5` and `stock_max = 100`.
    pub fn product(organization_id: OrganizationId, name: &str, stock_current: i64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::now_v7(),
            organization_id,
            category_id: None,
            name: name.to_string(),
            reference: None,
            stock_current,
            stock_min: 5,
            stock_max: 100,
            unit_price: Some(1.5),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn technician(organization_id: OrganizationId) -> Technician {
        Technician {
            id: TechnicianId::now_v7(),
            organization_id,
            first_name: "Léa".to_string(),
            last_name: "Martin".to_string(),
            email: Some("lea.martin@example.com".to_string()),
            phone: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn category(organization_id: OrganizationId, name: &str) -> Category {
        Category {
            id: CategoryId::now_v7(),
            organization_id,
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn organization(name: &str) -> Organization {
        Organization {
            id: OrganizationId::now_v7(),
            name: name.to_string(),
            slug: Some(name.to_lowercase().replace(' ', "-")),
            logo_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn member(organization_id: OrganizationId, email: &str) -> OrganizationMember {
        OrganizationMember {
            id: MemberId::now_v7(),
            organization_id,
            user_id: UserId::now_v7(),
            email: email.to_string(),
            role: MemberRole::Member,
            joined_at: Utc::now(),
        }
    }

    pub fn restock_item(product_id: ProductId, quantity: i64) -> RestockItem {
        RestockItem {
            product_id,
            quantity: Quantity::new(quantity).unwrap_or_else(|e| panic!("{}", e)),
        }
    }

    pub fn to_value<T: serde::Serialize>(value: &T) -> Value {
        serde_json::to_value(value).unwrap_or_else(|e| panic!("fixture serialization: {}", e))
    }

    /// A fresh cache holding the detail entry of each product.
    pub fn cache_with_products(products: &[Product]) -> Arc<QueryCache> {
        let cache = Arc::new(QueryCache::default());
        for product in products {
            cache
                .set_value(ProductKeys::detail(product.id), to_value(product))
                .unwrap_or_else(|e| panic!("seeding cache: {}", e));
        }
        cache
    }

    /// Cached `stock_current` of a product detail entry.
    pub fn cached_stock(cache: &QueryCache, product_id: ProductId) -> Option<i64> {
        cache
            .get(&ProductKeys::detail(product_id))
            .ok()
            .flatten()
            .and_then(|value| value.get("stock_current").and_then(Value::as_i64))
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

/// Custom assertions.
pub mod assertions {
    use super::*;

    /// Assert the result is a local validation failure.
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &StockroomResult<T>) {
        match result {
            Err(StockroomError::Validation(_)) => {}
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    /// Assert the result is a remote failure of the given kind.
    pub fn assert_remote_kind<T: std::fmt::Debug>(
        result: &StockroomResult<T>,
        expected: RemoteErrorKind,
    ) {
        match result {
            Err(StockroomError::Remote(err)) => assert_eq!(
                err.kind(),
                expected,
                "Unexpected remote error kind for {:?}",
                err.message
            ),
            other => panic!("Expected remote error {:?}, got {:?}", expected, other),
        }
    }

    pub fn assert_insufficient_stock<T: std::fmt::Debug>(result: &StockroomResult<T>) {
        assert_remote_kind(result, RemoteErrorKind::InsufficientStock);
    }
}
