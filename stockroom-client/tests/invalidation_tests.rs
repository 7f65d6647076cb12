//! Invalidation fan-out after mutations settle.

use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use stockroom_client::{
    BatchLine, Mutations, StockEntryInput, StockExitInput, TechnicianBatchInput,
};
use stockroom_storage::{
    CacheEvent, CacheKey, DashboardKeys, EntityKeys, InventoryKeys, MovementFilters, MovementKeys,
    NamespaceKeys, ProductFilters, ProductKeys, QueryCache, TechnicianKeys,
};
use stockroom_test_utils::assertions::assert_insufficient_stock;
use stockroom_test_utils::fixtures;
use stockroom_test_utils::{
    EntityIdType, MockInventoryBackend, MovementType, OrganizationId, Product, Technician,
};
use tokio::sync::broadcast;

struct World {
    org: OrganizationId,
    products: Vec<Product>,
    technician: Technician,
    cache: Arc<QueryCache>,
    backend: Arc<MockInventoryBackend>,
}

/// Three cached products plus the derived views of the first and last one.
fn world() -> World {
    let org = OrganizationId::now_v7();
    let products = vec![
        fixtures::product(org, "Vis", 50),
        fixtures::product(org, "Cheville", 30),
        fixtures::product(org, "Câble 2.5", 80),
    ];
    let technician = fixtures::technician(org);
    let cache = fixtures::cache_with_products(&products);
    let backend = MockInventoryBackend::new();
    for product in &products {
        backend.insert_product(product.clone());
    }
    backend.insert_technician(technician.clone());

    for key in views(org, &products, technician.id) {
        cache.set_value(key, json!([])).unwrap();
    }

    World {
        org,
        products,
        technician,
        cache,
        backend: Arc::new(backend),
    }
}

fn views(
    org: OrganizationId,
    products: &[Product],
    technician_id: stockroom_test_utils::TechnicianId,
) -> Vec<CacheKey> {
    vec![
        ProductKeys::list(&ProductFilters::for_organization(org)),
        ProductKeys::stats(Some(org)),
        ProductKeys::low_stock(Some(org)),
        MovementKeys::list(&MovementFilters::default()),
        MovementKeys::summary(Some(org)),
        MovementKeys::by_product(products[0].id),
        MovementKeys::by_product(products[2].id),
        TechnicianKeys::list(Some(org)),
        TechnicianKeys::inventory(technician_id),
        DashboardKeys::stats(Some(org)),
        InventoryKeys::summary(Some(org)),
        InventoryKeys::by_technician(technician_id),
    ]
}

fn drain_invalidated(rx: &mut broadcast::Receiver<CacheEvent>) -> BTreeSet<String> {
    let mut prefixes = BTreeSet::new();
    while let Ok(event) = rx.try_recv() {
        if let CacheEvent::Invalidated { prefix, .. } = event {
            prefixes.insert(prefix.to_string());
        }
    }
    prefixes
}

fn line(product: &Product, quantity: i64) -> BatchLine {
    BatchLine {
        product_id: product.id,
        quantity,
    }
}

#[tokio::test]
async fn restock_invalidates_batch_products_and_derived_views() {
    let w = world();
    let mut rx = w.cache.subscribe();
    let mutations = Mutations::new(w.cache.clone(), w.backend.clone());

    let outcome = mutations
        .restock_technician(TechnicianBatchInput {
            technician_id: w.technician.id,
            items: vec![line(&w.products[0], 5), line(&w.products[1], 3)],
        })
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.items_count, 2);

    let detail = |p: &Product| ProductKeys::detail(p.id);
    assert!(w.cache.is_invalidated(&detail(&w.products[0])).unwrap());
    assert!(w.cache.is_invalidated(&detail(&w.products[1])).unwrap());
    assert!(!w.cache.is_invalidated(&detail(&w.products[2])).unwrap());
    for key in views(w.org, &w.products, w.technician.id) {
        let expected = key != MovementKeys::by_product(w.products[2].id);
        assert_eq!(
            w.cache.is_invalidated(&key).unwrap(),
            expected,
            "unexpected invalidation state for {}",
            key
        );
    }

    let expected: BTreeSet<String> = [
        TechnicianKeys::all(),
        ProductKeys::lists(),
        ProductKeys::all_stats(),
        ProductKeys::all_low_stock(),
        detail(&w.products[0]),
        detail(&w.products[1]),
        MovementKeys::lists(),
        MovementKeys::summaries(),
        MovementKeys::by_product(w.products[0].id),
        MovementKeys::by_product(w.products[1].id),
        DashboardKeys::all(),
        InventoryKeys::all(),
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    assert_eq!(drain_invalidated(&mut rx), expected);
    assert_eq!(w.backend.technician_stock(w.technician.id, w.products[0].id), 5);
}

#[tokio::test]
async fn failed_batch_changes_nothing_and_still_invalidates() {
    let w = world();
    let mutations = Mutations::new(w.cache.clone(), w.backend.clone());

    let result = mutations
        .add_to_technician_inventory(TechnicianBatchInput {
            technician_id: w.technician.id,
            items: vec![line(&w.products[0], 5), line(&w.products[1], 31)],
        })
        .await;

    assert_insufficient_stock(&result);
    assert_eq!(w.backend.stock_of(w.products[0].id), Some(50));
    assert_eq!(w.backend.stock_of(w.products[1].id), Some(30));
    assert_eq!(w.backend.technician_stock(w.technician.id, w.products[0].id), 0);
    assert!(w
        .cache
        .is_invalidated(&TechnicianKeys::list(Some(w.org)))
        .unwrap());
}

fn exit_of(w: &World, movement_type: MovementType) -> StockExitInput {
    StockExitInput {
        organization_id: w.org,
        product_id: w.products[2].id,
        quantity: 4,
        movement_type,
        technician_id: movement_type
            .touches_technician()
            .then_some(w.technician.id),
        notes: None,
    }
}

#[tokio::test]
async fn only_technician_exits_invalidate_technician_views() {
    for movement_type in [MovementType::ExitAnonymous, MovementType::ExitLoss] {
        let w = world();
        let mutations = Mutations::new(w.cache.clone(), w.backend.clone());
        mutations
            .create_stock_exit(exit_of(&w, movement_type))
            .await
            .unwrap();

        assert!(!w
            .cache
            .is_invalidated(&TechnicianKeys::list(Some(w.org)))
            .unwrap());
        assert!(!w
            .cache
            .is_invalidated(&InventoryKeys::summary(Some(w.org)))
            .unwrap());
        assert!(w
            .cache
            .is_invalidated(&MovementKeys::summary(Some(w.org)))
            .unwrap());
        assert!(w
            .cache
            .is_invalidated(&MovementKeys::by_product(w.products[2].id))
            .unwrap());
        assert!(!w
            .cache
            .is_invalidated(&MovementKeys::by_product(w.products[0].id))
            .unwrap());
    }

    let w = world();
    let mutations = Mutations::new(w.cache.clone(), w.backend.clone());
    mutations
        .create_stock_exit(exit_of(&w, MovementType::ExitTechnician))
        .await
        .unwrap();
    assert!(w
        .cache
        .is_invalidated(&TechnicianKeys::list(Some(w.org)))
        .unwrap());
    assert!(w
        .cache
        .is_invalidated(&TechnicianKeys::inventory(w.technician.id))
        .unwrap());
    assert!(w
        .cache
        .is_invalidated(&InventoryKeys::by_technician(w.technician.id))
        .unwrap());
    assert!(w
        .cache
        .is_invalidated(&InventoryKeys::summary(Some(w.org)))
        .unwrap());
    assert_eq!(w.backend.technician_stock(w.technician.id, w.products[2].id), 4);
}

#[tokio::test]
async fn movements_invalidate_stock_derived_views() {
    let w = world();
    let mutations = Mutations::new(w.cache.clone(), w.backend.clone());

    mutations
        .create_stock_exit(StockExitInput {
            organization_id: w.org,
            product_id: w.products[0].id,
            quantity: 45,
            movement_type: MovementType::ExitTechnician,
            technician_id: Some(w.technician.id),
            notes: None,
        })
        .await
        .unwrap();
    for key in [
        ProductKeys::low_stock(Some(w.org)),
        ProductKeys::stats(Some(w.org)),
        MovementKeys::by_product(w.products[0].id),
        InventoryKeys::by_technician(w.technician.id),
    ] {
        assert!(w.cache.is_invalidated(&key).unwrap(), "{} left fresh", key);
    }

    for key in views(w.org, &w.products, w.technician.id) {
        w.cache.set_value(key, json!([])).unwrap();
    }
    mutations
        .create_stock_entry(StockEntryInput {
            organization_id: w.org,
            product_id: w.products[2].id,
            quantity: 10,
            notes: None,
        })
        .await
        .unwrap();
    assert!(w.cache.is_invalidated(&ProductKeys::low_stock(Some(w.org))).unwrap());
    assert!(w.cache.is_invalidated(&ProductKeys::stats(Some(w.org))).unwrap());
    assert!(w
        .cache
        .is_invalidated(&MovementKeys::by_product(w.products[2].id))
        .unwrap());
    assert!(!w
        .cache
        .is_invalidated(&MovementKeys::by_product(w.products[0].id))
        .unwrap());
    assert!(!w
        .cache
        .is_invalidated(&InventoryKeys::by_technician(w.technician.id))
        .unwrap());
}

#[tokio::test]
async fn invalidated_detail_is_refetched_on_next_read() {
    let w = world();
    let mutations = Mutations::new(w.cache.clone(), w.backend.clone());
    let queries = stockroom_client::Queries::new(w.cache.clone(), w.backend.clone());
    let product = &w.products[0];

    mutations
        .create_stock_exit(StockExitInput {
            organization_id: w.org,
            product_id: product.id,
            quantity: 7,
            movement_type: MovementType::ExitLoss,
            technician_id: None,
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(w.backend.call_count("fetch_product"), 0);

    let freshness = stockroom_storage::Freshness::best_effort(std::time::Duration::from_secs(300));
    let read = queries.product(product.id, freshness).await.unwrap();
    assert!(read.was_cache_miss());
    assert_eq!(read.value().stock_current, 43);
    assert_eq!(w.backend.call_count("fetch_product"), 1);

    let again = queries.product(product.id, freshness).await.unwrap();
    assert!(again.was_cache_hit());
}
