//! Optimistic mutation lifecycle against the in-memory backend.
//!
//! Covers local validation, projection while the call is in flight, exact
//! rollback on failure and list-deletion rollback.

use serde_json::{json, Value};
use std::sync::Arc;
use stockroom_client::{BatchLine, Mutations, StockEntryInput, StockExitInput, TechnicianBatchInput};
use stockroom_core::{
    CategoryUpdate, InvitationRequest, MemberRole, OrganizationUpdate, ProductUpdate,
    TechnicianUpdate, UserId, ValidationError,
};
use stockroom_storage::{
    CategoryKeys, EntityKeys, OrganizationKeys, ProductFilters, ProductKeys, QueryCache,
    TechnicianKeys,
};
use stockroom_test_utils::assertions::{
    assert_insufficient_stock, assert_remote_kind, assert_validation_error,
};
use stockroom_test_utils::fixtures::{self, cached_stock};
use stockroom_test_utils::{
    EntityIdType, MockInventoryBackend, OrganizationId, Product, RemoteError, RemoteErrorKind,
    StockroomError,
};

fn setup(stock: i64) -> (Product, Arc<QueryCache>, Arc<MockInventoryBackend>) {
    let org = OrganizationId::now_v7();
    let product = fixtures::product(org, "Disjoncteur 16A", stock);
    let cache = fixtures::cache_with_products(std::slice::from_ref(&product));
    let backend = Arc::new(MockInventoryBackend::new().with_product(product.clone()));
    (product, cache, backend)
}

fn entry(product: &Product, quantity: i64) -> StockEntryInput {
    StockEntryInput {
        organization_id: product.organization_id,
        product_id: product.id,
        quantity,
        notes: None,
    }
}

fn exit(product: &Product, quantity: i64) -> StockExitInput {
    StockExitInput {
        organization_id: product.organization_id,
        product_id: product.id,
        quantity,
        movement_type: stockroom_core::MovementType::ExitAnonymous,
        technician_id: None,
        notes: Some("chantier".to_string()),
    }
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn non_positive_quantity_never_reaches_backend() {
    let (product, cache, backend) = setup(50);
    let mutations = Mutations::new(cache.clone(), backend.clone());

    for quantity in [0, -1, -50] {
        let result = mutations.create_stock_entry(entry(&product, quantity)).await;
        assert_validation_error(&result);
        let result = mutations.create_stock_exit(exit(&product, quantity)).await;
        assert_validation_error(&result);
    }

    let err = mutations
        .create_stock_exit(exit(&product, 0))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: La quantité doit être positive (quantity = 0)"
    );
    assert_eq!(backend.total_calls(), 0);
    assert_eq!(cached_stock(&cache, product.id), Some(50));
    assert_eq!(cache.in_flight(&ProductKeys::detail(product.id)).unwrap(), 0);
}

#[tokio::test]
async fn empty_batch_is_rejected_locally() {
    let (_, cache, backend) = setup(50);
    let mutations = Mutations::new(cache, backend.clone());

    let result = mutations
        .restock_technician(TechnicianBatchInput {
            technician_id: stockroom_core::TechnicianId::now_v7(),
            items: Vec::new(),
        })
        .await;
    assert!(matches!(
        result,
        Err(StockroomError::Validation(ValidationError::EmptyBatch))
    ));
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn blank_invitation_email_is_rejected_locally() {
    let (product, cache, backend) = setup(50);
    let mutations = Mutations::new(cache, backend.clone());

    let result = mutations
        .invite_member(InvitationRequest {
            organization_id: product.organization_id,
            email: "   ".to_string(),
            role: MemberRole::Member,
        })
        .await;
    assert!(matches!(
        result,
        Err(StockroomError::Validation(ValidationError::RequiredFieldMissing { ref field }))
            if field == "email"
    ));
    assert_eq!(backend.total_calls(), 0);
}

// ============================================================================
// Stock movements
// ============================================================================

#[tokio::test]
async fn entry_projects_then_keeps_value_on_success() {
    let (product, cache, backend) = setup(50);
    let mutations = Mutations::new(cache.clone(), backend.clone());

    let movement = mutations.create_stock_entry(entry(&product, 10)).await.unwrap();

    assert_eq!(movement.quantity.get(), 10);
    assert_eq!(cached_stock(&cache, product.id), Some(60));
    assert_eq!(backend.stock_of(product.id), Some(60));
    assert!(cache.is_invalidated(&ProductKeys::detail(product.id)).unwrap());
}

#[tokio::test]
async fn entry_failure_restores_snapshot() {
    let (product, cache, backend) = setup(50);
    backend.fail_next(
        "create_stock_entry",
        RemoteError::new("Produit verrouillé").with_status(409),
    );
    let mutations = Mutations::new(cache.clone(), backend.clone());

    let result = mutations.create_stock_entry(entry(&product, 10)).await;

    assert_remote_kind(&result, RemoteErrorKind::Other);
    assert_eq!(cached_stock(&cache, product.id), Some(50));
    assert_eq!(backend.stock_of(product.id), Some(50));
    assert_eq!(cache.stats().unwrap().rollbacks, 1);
}

#[tokio::test]
async fn exit_projects_then_keeps_value_on_success() {
    let (product, cache, backend) = setup(50);
    let mutations = Mutations::new(cache.clone(), backend.clone());

    mutations.create_stock_exit(exit(&product, 5)).await.unwrap();

    assert_eq!(cached_stock(&cache, product.id), Some(45));
    assert_eq!(backend.stock_of(product.id), Some(45));
}

#[tokio::test]
async fn insufficient_stock_exit_rolls_back() {
    let (product, cache, backend) = setup(50);
    let before = cache.get(&ProductKeys::detail(product.id)).unwrap();
    let mutations = Mutations::new(cache.clone(), backend.clone());

    let result = mutations.create_stock_exit(exit(&product, 80)).await;

    assert_insufficient_stock(&result);
    assert_eq!(cache.get(&ProductKeys::detail(product.id)).unwrap(), before);
    assert_eq!(backend.stock_of(product.id), Some(50));
    assert!(backend.movements().is_empty());
}

#[tokio::test]
async fn projection_is_visible_while_call_is_in_flight() {
    let org = OrganizationId::now_v7();
    let product = fixtures::product(org, "Gaine ICTA", 50);
    let cache = fixtures::cache_with_products(std::slice::from_ref(&product));
    let (backend, mut gate) = MockInventoryBackend::gated();
    let backend = Arc::new(backend.with_product(product.clone()));
    let mutations = Arc::new(Mutations::new(cache.clone(), backend.clone()));

    let task = {
        let mutations = Arc::clone(&mutations);
        let input = exit(&product, 5);
        tokio::spawn(async move { mutations.create_stock_exit(input).await })
    };

    assert_eq!(gate.next_started().await, Some("create_stock_exit"));
    assert_eq!(cached_stock(&cache, product.id), Some(45));
    assert_eq!(backend.stock_of(product.id), Some(50));

    backend.fail_next("create_stock_exit", RemoteError::transport("connexion perdue"));
    gate.release(1);
    let result = task.await.unwrap();

    assert_remote_kind(&result, RemoteErrorKind::Transport);
    assert_eq!(cached_stock(&cache, product.id), Some(50));
}

// ============================================================================
// Field edits
// ============================================================================

#[tokio::test]
async fn product_update_merges_fields_and_rolls_back() {
    let product = fixtures::product(OrganizationId::now_v7(), "Disjoncteur 16A", 50);
    let cache = fixtures::cache_with_products(std::slice::from_ref(&product));
    let (gated, mut gate) = MockInventoryBackend::gated();
    let gated = Arc::new(gated.with_product(product.clone()));
    let mutations = Arc::new(Mutations::new(cache.clone(), gated.clone()));

    let task = {
        let mutations = Arc::clone(&mutations);
        let product_id = product.id;
        tokio::spawn(async move {
            mutations
                .update_product(
                    product_id,
                    ProductUpdate {
                        name: Some("Disjoncteur 20A".to_string()),
                        stock_min: Some(10),
                        ..Default::default()
                    },
                )
                .await
        })
    };

    assert_eq!(gate.next_started().await, Some("update_product"));
    let projected = cache.get(&ProductKeys::detail(product.id)).unwrap().unwrap();
    assert_eq!(projected["name"], "Disjoncteur 20A");
    assert_eq!(projected["stock_min"], 10);
    assert_eq!(projected["stock_current"], 50);

    gated.fail_next("update_product", RemoteError::new("Accès refusé").with_status(403));
    gate.release(1);
    let result = task.await.unwrap();

    assert_remote_kind(&result, RemoteErrorKind::Unauthorized);
    let restored = cache.get(&ProductKeys::detail(product.id)).unwrap().unwrap();
    assert_eq!(restored, fixtures::to_value(&product));
}

#[tokio::test]
async fn technician_update_rejects_blank_name() {
    let (_, cache, backend) = setup(50);
    let mutations = Mutations::new(cache, backend.clone());

    let result = mutations
        .update_technician(
            stockroom_core::TechnicianId::now_v7(),
            TechnicianUpdate {
                last_name: Some(String::new()),
                ..Default::default()
            },
        )
        .await;
    assert_validation_error(&result);
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn edited_names_are_trimmed_before_sending() {
    let org = OrganizationId::now_v7();
    let product = fixtures::product(org, "Disjoncteur 16A", 50);
    let technician = fixtures::technician(org);
    let category = fixtures::category(org, "Protection");
    let cache = fixtures::cache_with_products(std::slice::from_ref(&product));
    let backend = Arc::new(MockInventoryBackend::new().with_product(product.clone()));
    backend.insert_technician(technician.clone());
    backend.insert_category(category.clone());
    let mutations = Mutations::new(cache.clone(), backend.clone());

    mutations
        .update_product(
            product.id,
            ProductUpdate {
                name: Some("  Disjoncteur 20A ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(backend.product(product.id).unwrap().name, "Disjoncteur 20A");
    let cached = cache.get(&ProductKeys::detail(product.id)).unwrap().unwrap();
    assert_eq!(cached["name"], "Disjoncteur 20A");

    let updated = mutations
        .update_technician(
            technician.id,
            TechnicianUpdate {
                first_name: Some(" Noé".to_string()),
                last_name: Some("Durand\t".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.first_name, "Noé");
    assert_eq!(updated.last_name, "Durand");

    let updated = mutations
        .update_category(
            category.id,
            CategoryUpdate {
                name: Some(" Câblage ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Câblage");
}

#[tokio::test]
async fn organization_update_merges_trimmed_name_and_rolls_back() {
    let org = fixtures::organization("Atelier Nord");
    let key = OrganizationKeys::detail(org.id);
    let memberships = OrganizationKeys::list(Some(UserId::now_v7()));
    let cache = Arc::new(QueryCache::default());
    cache.set_value(key.clone(), fixtures::to_value(&org)).unwrap();
    cache
        .set_value(memberships.clone(), json!([fixtures::to_value(&org)]))
        .unwrap();
    let (backend, mut gate) = MockInventoryBackend::gated();
    backend.insert_organization(org.clone());
    let backend = Arc::new(backend);
    let mutations = Arc::new(Mutations::new(cache.clone(), backend.clone()));

    let spawn_rename = |name: &str| {
        let mutations = Arc::clone(&mutations);
        let update = OrganizationUpdate {
            name: Some(name.to_string()),
            ..Default::default()
        };
        let id = org.id;
        tokio::spawn(async move { mutations.update_organization(id, update).await })
    };

    let task = spawn_rename(" Atelier Sud ");
    assert_eq!(gate.next_started().await, Some("update_organization"));
    let projected = cache.get(&key).unwrap().unwrap();
    assert_eq!(projected["name"], "Atelier Sud");
    assert_eq!(projected["slug"], "atelier-nord");

    backend.fail_next("update_organization", RemoteError::new("Accès refusé").with_status(403));
    gate.release(1);
    assert_remote_kind(&task.await.unwrap(), RemoteErrorKind::Unauthorized);
    assert_eq!(cache.get(&key).unwrap(), Some(fixtures::to_value(&org)));
    assert_eq!(cache.stats().unwrap().rollbacks, 1);

    let task = spawn_rename("Atelier Sud");
    assert_eq!(gate.next_started().await, Some("update_organization"));
    gate.release(1);
    let renamed = task.await.unwrap().unwrap();
    assert_eq!(renamed.name, "Atelier Sud");
    assert_eq!(cache.get(&key).unwrap().unwrap()["name"], "Atelier Sud");
    assert_eq!(cache.in_flight(&key).unwrap(), 0);
    assert!(cache.is_invalidated(&memberships).unwrap());
}

// ============================================================================
// List deletions
// ============================================================================

fn list_of(products: &[&Product]) -> Value {
    Value::Array(products.iter().map(|p| fixtures::to_value(*p)).collect())
}

#[tokio::test]
async fn product_delete_filters_every_list_and_restores_each_on_failure() {
    let org = OrganizationId::now_v7();
    let kept = fixtures::product(org, "Vis", 10);
    let deleted = fixtures::product(org, "Cheville", 20);
    let cache = Arc::new(QueryCache::default());
    let by_org = ProductKeys::list(&ProductFilters::for_organization(org));
    let unfiltered = ProductKeys::list(&ProductFilters::default());
    let low_stock = ProductKeys::list(&ProductFilters {
        low_stock_only: true,
        ..ProductFilters::for_organization(org)
    });
    cache.set_value(by_org.clone(), list_of(&[&kept, &deleted])).unwrap();
    cache.set_value(unfiltered.clone(), list_of(&[&deleted])).unwrap();
    cache.set_value(low_stock.clone(), list_of(&[&kept])).unwrap();

    let (backend, mut gate) = MockInventoryBackend::gated();
    let backend = Arc::new(backend.with_product(kept.clone()).with_product(deleted.clone()));
    let mutations = Arc::new(Mutations::new(cache.clone(), backend.clone()));

    let task = {
        let mutations = Arc::clone(&mutations);
        let id = deleted.id;
        tokio::spawn(async move { mutations.delete_product(id).await })
    };

    assert_eq!(gate.next_started().await, Some("delete_product"));
    assert_eq!(cache.get(&by_org).unwrap(), Some(list_of(&[&kept])));
    assert_eq!(cache.get(&unfiltered).unwrap(), Some(json!([])));
    assert_eq!(cache.in_flight(&low_stock).unwrap(), 0);

    backend.fail_next("delete_product", RemoteError::new("Produit introuvable").with_status(404));
    gate.release(1);
    let result = task.await.unwrap();

    assert_remote_kind(&result, RemoteErrorKind::NotFound);
    assert_eq!(cache.get(&by_org).unwrap(), Some(list_of(&[&kept, &deleted])));
    assert_eq!(cache.get(&unfiltered).unwrap(), Some(list_of(&[&deleted])));
    assert_eq!(cache.get(&low_stock).unwrap(), Some(list_of(&[&kept])));
}

#[tokio::test]
async fn technician_delete_keeps_filtered_lists_on_success() {
    let org = OrganizationId::now_v7();
    let technician = fixtures::technician(org);
    let other = fixtures::technician(org);
    let backend = Arc::new(MockInventoryBackend::new());
    backend.insert_technician(technician.clone());
    backend.insert_technician(other.clone());
    let cache = Arc::new(QueryCache::default());
    let list = TechnicianKeys::list(Some(org));
    cache
        .set_value(
            list.clone(),
            json!([fixtures::to_value(&technician), fixtures::to_value(&other)]),
        )
        .unwrap();
    let mutations = Mutations::new(cache.clone(), backend.clone());

    mutations.delete_technician(technician.id).await.unwrap();

    let remaining = cache.get(&list).unwrap().unwrap();
    assert_eq!(remaining, json!([fixtures::to_value(&other)]));
    assert!(cache.is_invalidated(&list).unwrap());
    assert_eq!(cache.in_flight(&list).unwrap(), 0);
}

#[tokio::test]
async fn category_delete_filters_every_list_and_restores_each_on_failure() {
    let org = OrganizationId::now_v7();
    let kept = fixtures::category(org, "Visserie");
    let deleted = fixtures::category(org, "Éclairage");
    let cache = Arc::new(QueryCache::default());
    let by_org = CategoryKeys::list(Some(org));
    let unfiltered = CategoryKeys::list(None);
    let both = json!([fixtures::to_value(&kept), fixtures::to_value(&deleted)]);
    cache.set_value(by_org.clone(), both.clone()).unwrap();
    cache
        .set_value(unfiltered.clone(), json!([fixtures::to_value(&deleted)]))
        .unwrap();

    let (backend, mut gate) = MockInventoryBackend::gated();
    backend.insert_category(kept.clone());
    backend.insert_category(deleted.clone());
    let backend = Arc::new(backend);
    let mutations = Arc::new(Mutations::new(cache.clone(), backend.clone()));
    let spawn_delete = || {
        let mutations = Arc::clone(&mutations);
        let id = deleted.id;
        tokio::spawn(async move { mutations.delete_category(id).await })
    };

    let task = spawn_delete();
    assert_eq!(gate.next_started().await, Some("delete_category"));
    assert_eq!(
        cache.get(&by_org).unwrap(),
        Some(json!([fixtures::to_value(&kept)]))
    );
    assert_eq!(cache.get(&unfiltered).unwrap(), Some(json!([])));

    backend.fail_next("delete_category", RemoteError::transport("connexion perdue"));
    gate.release(1);
    assert_remote_kind(&task.await.unwrap(), RemoteErrorKind::Transport);
    assert_eq!(cache.get(&by_org).unwrap(), Some(both));
    assert_eq!(
        cache.get(&unfiltered).unwrap(),
        Some(json!([fixtures::to_value(&deleted)]))
    );
    assert_eq!(cache.stats().unwrap().rollbacks, 2);

    let task = spawn_delete();
    assert_eq!(gate.next_started().await, Some("delete_category"));
    gate.release(1);
    task.await.unwrap().unwrap();
    assert_eq!(
        cache.get(&by_org).unwrap(),
        Some(json!([fixtures::to_value(&kept)]))
    );
    assert!(cache.is_invalidated(&by_org).unwrap());
    assert_eq!(cache.in_flight(&unfiltered).unwrap(), 0);
}

#[tokio::test]
async fn organization_delete_filters_membership_lists_and_restores_on_failure() {
    let kept = fixtures::organization("Atelier Nord");
    let deleted = fixtures::organization("Atelier Sud");
    let first_user = OrganizationKeys::list(Some(UserId::now_v7()));
    let second_user = OrganizationKeys::list(Some(UserId::now_v7()));
    let both = json!([fixtures::to_value(&kept), fixtures::to_value(&deleted)]);
    let cache = Arc::new(QueryCache::default());
    cache.set_value(first_user.clone(), both.clone()).unwrap();
    cache
        .set_value(second_user.clone(), json!([fixtures::to_value(&deleted)]))
        .unwrap();

    let (backend, mut gate) = MockInventoryBackend::gated();
    backend.insert_organization(kept.clone());
    backend.insert_organization(deleted.clone());
    let backend = Arc::new(backend);
    let mutations = Arc::new(Mutations::new(cache.clone(), backend.clone()));
    let spawn_delete = || {
        let mutations = Arc::clone(&mutations);
        let id = deleted.id;
        tokio::spawn(async move { mutations.delete_organization(id).await })
    };

    let task = spawn_delete();
    assert_eq!(gate.next_started().await, Some("delete_organization"));
    assert_eq!(
        cache.get(&first_user).unwrap(),
        Some(json!([fixtures::to_value(&kept)]))
    );
    assert_eq!(cache.get(&second_user).unwrap(), Some(json!([])));

    backend.fail_next(
        "delete_organization",
        RemoteError::new("Organisation introuvable").with_status(404),
    );
    gate.release(1);
    assert_remote_kind(&task.await.unwrap(), RemoteErrorKind::NotFound);
    assert_eq!(cache.get(&first_user).unwrap(), Some(both));
    assert_eq!(
        cache.get(&second_user).unwrap(),
        Some(json!([fixtures::to_value(&deleted)]))
    );

    let task = spawn_delete();
    assert_eq!(gate.next_started().await, Some("delete_organization"));
    gate.release(1);
    task.await.unwrap().unwrap();
    assert_eq!(cache.get(&second_user).unwrap(), Some(json!([])));
    assert!(cache.is_invalidated(&first_user).unwrap());
    assert!(cache.is_invalidated(&second_user).unwrap());
}

// ============================================================================
// Members and invitations
// ============================================================================

#[tokio::test]
async fn remove_member_filters_member_list_and_restores_on_failure() {
    let org = fixtures::organization("Atelier");
    let kept = fixtures::member(org.id, "lea@example.com");
    let removed = fixtures::member(org.id, "noe@example.com");
    let other_org = OrganizationKeys::members(OrganizationId::now_v7());
    let members = OrganizationKeys::members(org.id);
    let both = json!([fixtures::to_value(&kept), fixtures::to_value(&removed)]);
    let cache = Arc::new(QueryCache::default());
    cache.set_value(members.clone(), both.clone()).unwrap();
    cache
        .set_value(other_org.clone(), json!([fixtures::to_value(&removed)]))
        .unwrap();

    let (backend, mut gate) = MockInventoryBackend::gated();
    backend.insert_organization(org.clone());
    backend.insert_member(kept.clone());
    backend.insert_member(removed.clone());
    let backend = Arc::new(backend);
    let mutations = Arc::new(Mutations::new(cache.clone(), backend.clone()));
    let spawn_remove = || {
        let mutations = Arc::clone(&mutations);
        let (org_id, member_id) = (org.id, removed.id);
        tokio::spawn(async move { mutations.remove_member(org_id, member_id).await })
    };

    let task = spawn_remove();
    assert_eq!(gate.next_started().await, Some("remove_member"));
    assert_eq!(
        cache.get(&members).unwrap(),
        Some(json!([fixtures::to_value(&kept)]))
    );
    assert_eq!(cache.in_flight(&other_org).unwrap(), 0);

    backend.fail_next("remove_member", RemoteError::new("Accès refusé").with_status(403));
    gate.release(1);
    assert_remote_kind(&task.await.unwrap(), RemoteErrorKind::Unauthorized);
    assert_eq!(cache.get(&members).unwrap(), Some(both));

    let task = spawn_remove();
    assert_eq!(gate.next_started().await, Some("remove_member"));
    gate.release(1);
    task.await.unwrap().unwrap();
    assert_eq!(
        cache.get(&members).unwrap(),
        Some(json!([fixtures::to_value(&kept)]))
    );
    assert!(cache.is_invalidated(&members).unwrap());
    assert!(!cache.is_invalidated(&other_org).unwrap());
    assert_eq!(
        cache.get(&other_org).unwrap(),
        Some(json!([fixtures::to_value(&removed)]))
    );
}

#[tokio::test]
async fn duplicate_invitation_is_classified() {
    let org = fixtures::organization("Atelier");
    let backend = Arc::new(MockInventoryBackend::new());
    backend.insert_organization(org.clone());
    let mutations = Mutations::new(Arc::new(QueryCache::default()), backend.clone());
    let request = InvitationRequest {
        organization_id: org.id,
        email: "paul@example.com".to_string(),
        role: MemberRole::Admin,
    };

    let invitation = mutations.invite_member(request.clone()).await.unwrap();
    let again = mutations
        .invite_member(InvitationRequest {
            email: " PAUL@example.com ".to_string(),
            ..request
        })
        .await;
    assert_remote_kind(&again, RemoteErrorKind::DuplicateEmail);

    mutations
        .revoke_invitation(org.id, invitation.id)
        .await
        .unwrap();
    assert_eq!(
        backend.invitation(invitation.id).map(|i| i.status),
        Some(stockroom_core::InvitationStatus::Revoked)
    );
}

#[tokio::test]
async fn batch_with_invalid_line_is_rejected_before_any_call() {
    let (product, cache, backend) = setup(50);
    let mutations = Mutations::new(cache, backend.clone());

    let result = mutations
        .add_to_technician_inventory(TechnicianBatchInput {
            technician_id: stockroom_core::TechnicianId::now_v7(),
            items: vec![
                BatchLine {
                    product_id: product.id,
                    quantity: 3,
                },
                BatchLine {
                    product_id: product.id,
                    quantity: 0,
                },
            ],
        })
        .await;
    assert!(matches!(
        result,
        Err(StockroomError::Validation(ValidationError::NonPositiveQuantity { ref field, value: 0 }))
            if field == "items[1].quantity"
    ));
    assert_eq!(backend.total_calls(), 0);
}
