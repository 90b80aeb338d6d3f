mod common;

use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

use stockroom_api::entities::stock_item::Entity as StockItemEntity;
use stockroom_api::errors::ServiceError;
use stockroom_api::services::counts::{CreateInventoryCount, InventoryCountService};
use stockroom_api::services::reservations::{OfferStatusChange, ReservationService};
use stockroom_api::services::stock::{MovementFilters, StockService};

use common::{event_channel, movement_request, seed_location, seed_quotation, setup_db};

fn count_for(
    key: &stockroom_api::services::locations::LocationKey,
    product_id: Uuid,
    variant_id: &str,
    system: rust_decimal::Decimal,
    counted: rust_decimal::Decimal,
) -> CreateInventoryCount {
    CreateInventoryCount {
        warehouse_id: key.warehouse_id,
        rack_group_id: Some(key.rack_group_id),
        rack_level_id: Some(key.rack_level_id),
        rack_slot_id: Some(key.rack_slot_id),
        product_id,
        variant_id: Some(variant_id.to_string()),
        variant_name: None,
        system_quantity: system,
        counted_quantity: counted,
        note: None,
    }
}

#[tokio::test]
async fn approving_a_count_applies_the_correction_once() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let stock = StockService::new(db.clone(), events.clone(), 100);
    let counts = InventoryCountService::new(db.clone(), events);

    let product = Uuid::new_v4();
    let item = stock
        .stock_in(movement_request(&key, product, "V1", dec!(3)))
        .await
        .unwrap();

    let count = counts
        .create(count_for(&key, product, "V1", dec!(3), dec!(5)))
        .await
        .expect("create count");
    assert_eq!(count.difference, dec!(2));
    assert!(!count.is_approved);
    assert_eq!(
        count.full_address.as_deref(),
        Some("Main / A / 1. level / Slot 1")
    );

    let adjustment = counts.approve(count.id).await.expect("approve");
    assert_eq!(adjustment, dec!(2));

    let item_after = StockItemEntity::find_by_id(item.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item_after.quantity, dec!(5));

    let adjust_movements = stock
        .list_movements(MovementFilters {
            movement_type: Some("ADJUST".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(adjust_movements.len(), 1);
    assert_eq!(adjust_movements[0].quantity, dec!(2));

    // Approval is not repeatable
    let err = counts.approve(count.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let approved = counts.get(count.id).await.unwrap();
    assert!(approved.is_approved);
    assert!(approved.approved_at.is_some());
}

#[tokio::test]
async fn partial_location_count_approves_without_ledger_change() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let stock = StockService::new(db.clone(), events.clone(), 100);
    let counts = InventoryCountService::new(db.clone(), events);

    let product = Uuid::new_v4();
    let item = stock
        .stock_in(movement_request(&key, product, "V1", dec!(4)))
        .await
        .unwrap();

    // Warehouse-only count: the address is partial and no ledger row matches
    let count = counts
        .create(CreateInventoryCount {
            warehouse_id: key.warehouse_id,
            rack_group_id: None,
            rack_level_id: None,
            rack_slot_id: None,
            product_id: product,
            variant_id: Some("V1".to_string()),
            variant_name: None,
            system_quantity: dec!(4),
            counted_quantity: dec!(9),
            note: None,
        })
        .await
        .unwrap();
    assert_eq!(count.full_address.as_deref(), Some("Main"));

    counts.approve(count.id).await.expect("approve");

    let item_after = StockItemEntity::find_by_id(item.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item_after.quantity, dec!(4), "ledger untouched");
}

#[tokio::test]
async fn count_below_reserved_quantity_is_refused() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let stock = StockService::new(db.clone(), events.clone(), 100);
    let counts = InventoryCountService::new(db.clone(), events.clone());
    let reservations = ReservationService::new(db.clone(), events, true);

    let product = Uuid::new_v4();
    stock
        .stock_in(movement_request(&key, product, "V1", dec!(6)))
        .await
        .unwrap();
    let (quotation_id, _) = seed_quotation(db.as_ref(), "Q-2001", product, "V1", dec!(5)).await;
    reservations
        .set_offer_status(
            quotation_id,
            OfferStatusChange {
                offer_status: "accepted".to_string(),
                rejection_reason: None,
            },
        )
        .await
        .unwrap();

    let count = counts
        .create(count_for(&key, product, "V1", dec!(6), dec!(2)))
        .await
        .unwrap();
    let err = counts.approve(count.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    // The count stays pending for a corrected retry
    let pending = counts.list(true).await.unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn listing_filters_pending_counts() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let stock = StockService::new(db.clone(), events.clone(), 100);
    let counts = InventoryCountService::new(db.clone(), events);

    let product = Uuid::new_v4();
    stock
        .stock_in(movement_request(&key, product, "V1", dec!(2)))
        .await
        .unwrap();

    let first = counts
        .create(count_for(&key, product, "V1", dec!(2), dec!(2)))
        .await
        .unwrap();
    counts
        .create(count_for(&key, product, "V1", dec!(2), dec!(1)))
        .await
        .unwrap();

    counts.approve(first.id).await.unwrap();

    assert_eq!(counts.list(false).await.unwrap().len(), 2);
    assert_eq!(counts.list(true).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_count_is_not_found() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let counts = InventoryCountService::new(db.clone(), events);

    let err = counts.approve(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
