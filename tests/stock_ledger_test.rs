mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use stockroom_api::entities::stock_movement::{self, Entity as StockMovementEntity, MovementType};
use stockroom_api::errors::ServiceError;
use stockroom_api::services::locations::LocationKey;
use stockroom_api::services::stock::{MovementFilters, StockFilters, StockService};

use common::{
    event_channel, movement_request, seed_location, seed_sibling_slot, setup_db, transfer_request,
};

/// Sums the on-hand movement deltas for one location+product+variant key.
async fn ledger_from_movements(
    db: &sea_orm::DatabaseConnection,
    key: &LocationKey,
    product_id: Uuid,
    variant_id: &str,
) -> Decimal {
    let movements = StockMovementEntity::find()
        .filter(stock_movement::Column::ProductId.eq(product_id))
        .filter(stock_movement::Column::VariantId.eq(variant_id))
        .all(db)
        .await
        .expect("list movements");

    movements
        .iter()
        .filter(|m| {
            MovementType::from_str(&m.movement_type)
                .map(|mt| mt.affects_on_hand())
                .unwrap_or(false)
        })
        .filter(|m| {
            // Source-side deltas for this slot, plus transfer arrivals
            let source_here = m.rack_slot_id == Some(key.rack_slot_id);
            let target_here = m.target_rack_slot_id == Some(key.rack_slot_id);
            source_here || target_here
        })
        .map(|m| {
            if MovementType::from_str(&m.movement_type) == Some(MovementType::Transfer) {
                if m.target_rack_slot_id == Some(key.rack_slot_id) {
                    m.quantity
                } else {
                    -m.quantity
                }
            } else {
                m.quantity
            }
        })
        .sum()
}

#[tokio::test]
async fn stock_in_creates_ledger_row_and_movement() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let product = Uuid::new_v4();
    let item = service
        .stock_in(movement_request(&key, product, "V1", dec!(10)))
        .await
        .expect("stock in");

    assert_eq!(item.quantity, dec!(10));
    assert_eq!(item.reserved_quantity, Decimal::ZERO);
    assert_eq!(item.min_stock, Decimal::ZERO);
    assert_eq!(
        item.full_address.as_deref(),
        Some("Main / A / 1. level / Slot 1")
    );

    let movements = service
        .list_movements(MovementFilters::default())
        .await
        .expect("movements");
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, "IN");
    assert_eq!(movements[0].quantity, dec!(10));
}

#[tokio::test]
async fn stock_in_rejects_non_positive_quantity() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let err = service
        .stock_in(movement_request(&key, Uuid::new_v4(), "V1", dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = service
        .stock_in(movement_request(&key, Uuid::new_v4(), "V1", dec!(-3)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn stock_in_accumulates_on_existing_key() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let product = Uuid::new_v4();
    service
        .stock_in(movement_request(&key, product, "V1", dec!(4)))
        .await
        .unwrap();
    let item = service
        .stock_in(movement_request(&key, product, "V1", dec!(6)))
        .await
        .unwrap();

    assert_eq!(item.quantity, dec!(10));

    let items = service
        .list_stock(StockFilters {
            product_id: Some(product),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(items.len(), 1, "one ledger row per key");
}

#[tokio::test]
async fn stock_out_respects_available_quantity() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let product = Uuid::new_v4();
    service
        .stock_in(movement_request(&key, product, "V1", dec!(10)))
        .await
        .unwrap();

    let item = service
        .stock_out(movement_request(&key, product, "V1", dec!(4)))
        .await
        .expect("stock out");
    assert_eq!(item.quantity, dec!(6));

    // Requesting more than available fails outright and changes nothing
    let err = service
        .stock_out(movement_request(&key, product, "V1", dec!(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let item = service.get_stock_item(item.id).await.unwrap();
    assert_eq!(item.quantity, dec!(6));

    let out_movements = service
        .list_movements(MovementFilters {
            movement_type: Some("OUT".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out_movements.len(), 1);
    assert_eq!(out_movements[0].quantity, dec!(-4));
}

#[tokio::test]
async fn stock_out_requires_existing_ledger_row() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let err = service
        .stock_out(movement_request(&key, Uuid::new_v4(), "V1", dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn transfer_conserves_quantity_and_logs_one_movement() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let target = seed_sibling_slot(db.clone(), &key, 2).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let product = Uuid::new_v4();
    service
        .stock_in(movement_request(&key, product, "V1", dec!(6)))
        .await
        .unwrap();

    let result = service
        .stock_transfer(transfer_request(&key, &target, product, "V1", dec!(3)))
        .await
        .expect("transfer");

    assert_eq!(result.source.quantity, dec!(3));
    assert_eq!(result.target.quantity, dec!(3));
    assert_eq!(
        result.source.quantity + result.target.quantity,
        dec!(6),
        "transfer neither creates nor destroys stock"
    );
    assert_eq!(result.to_address, "Main / A / 1. level / Slot 2");

    let transfers = service
        .list_movements(MovementFilters {
            movement_type: Some("TRANSFER".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(transfers.len(), 1, "one entry with both addresses");
    assert_eq!(
        transfers[0].source_address.as_deref(),
        Some("Main / A / 1. level / Slot 1")
    );
    assert_eq!(
        transfers[0].target_address.as_deref(),
        Some("Main / A / 1. level / Slot 2")
    );
}

#[tokio::test]
async fn transfer_rejects_when_exceeding_available() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let target = seed_sibling_slot(db.clone(), &key, 2).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let product = Uuid::new_v4();
    service
        .stock_in(movement_request(&key, product, "V1", dec!(5)))
        .await
        .unwrap();

    let err = service
        .stock_transfer(transfer_request(&key, &target, product, "V1", dec!(8)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
}

#[tokio::test]
async fn transfer_requires_target_location() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let err = service
        .stock_transfer(movement_request(&key, Uuid::new_v4(), "V1", dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn adjust_quantity_overwrites_and_logs_delta() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let product = Uuid::new_v4();
    let item = service
        .stock_in(movement_request(&key, product, "V1", dec!(7)))
        .await
        .unwrap();

    let (old, updated) = service
        .adjust_quantity(item.id, dec!(12), Some("recount".to_string()))
        .await
        .expect("adjust");
    assert_eq!(old, dec!(7));
    assert_eq!(updated.quantity, dec!(12));

    let adjustments = service
        .list_movements(MovementFilters {
            movement_type: Some("ADJUSTMENT".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].quantity, dec!(5));
    assert_eq!(
        adjustments[0].reference.as_deref(),
        Some("Manual adjustment: 7 -> 12")
    );
}

#[tokio::test]
async fn delete_stock_item_logs_full_negative_delta() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let product = Uuid::new_v4();
    let item = service
        .stock_in(movement_request(&key, product, "V1", dec!(9)))
        .await
        .unwrap();

    service.delete_stock_item(item.id).await.expect("delete");

    let err = service.get_stock_item(item.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let deletes = service
        .list_movements(MovementFilters {
            movement_type: Some("DELETE".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].quantity, dec!(-9));
}

#[tokio::test]
async fn ledger_is_reconstructible_from_movement_log() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let target = seed_sibling_slot(db.clone(), &key, 2).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let product = Uuid::new_v4();
    service
        .stock_in(movement_request(&key, product, "V1", dec!(10)))
        .await
        .unwrap();
    service
        .stock_out(movement_request(&key, product, "V1", dec!(4)))
        .await
        .unwrap();
    service
        .stock_transfer(transfer_request(&key, &target, product, "V1", dec!(2)))
        .await
        .unwrap();
    let items = service
        .list_stock(StockFilters {
            product_id: Some(product),
            ..Default::default()
        })
        .await
        .unwrap();
    let source_item = items
        .iter()
        .find(|i| i.rack_slot_id == key.rack_slot_id)
        .unwrap();
    service
        .adjust_quantity(source_item.id, dec!(6), None)
        .await
        .unwrap();

    let source_total = ledger_from_movements(db.as_ref(), &key, product, "V1").await;
    let target_total = ledger_from_movements(db.as_ref(), &target, product, "V1").await;

    let items = service
        .list_stock(StockFilters {
            product_id: Some(product),
            ..Default::default()
        })
        .await
        .unwrap();
    let source_item = items
        .iter()
        .find(|i| i.rack_slot_id == key.rack_slot_id)
        .unwrap();
    let target_item = items
        .iter()
        .find(|i| i.rack_slot_id == target.rack_slot_id)
        .unwrap();

    assert_eq!(source_total, source_item.quantity);
    assert_eq!(target_total, target_item.quantity);
}

#[tokio::test]
async fn summary_and_low_stock_report_grouped_totals() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let target = seed_sibling_slot(db.clone(), &key, 2).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 100);

    let product = Uuid::new_v4();
    service
        .stock_in(movement_request(&key, product, "V1", dec!(4)))
        .await
        .unwrap();
    service
        .stock_in(movement_request(&target, product, "V1", dec!(2)))
        .await
        .unwrap();

    let summary = service.stock_summary(None).await.unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].total_quantity, dec!(6));
    assert_eq!(summary[0].locations_count, 2);
    assert!(!summary[0].is_low_stock);

    // Raise the reorder threshold above the total to trip the report
    let items = service
        .list_stock(StockFilters::default())
        .await
        .unwrap();
    let item = items.first().unwrap();
    let mut active: stockroom_api::entities::stock_item::ActiveModel = item.clone().into();
    active.min_stock = sea_orm::Set(dec!(10));
    sea_orm::ActiveModelTrait::update(active, db.as_ref())
        .await
        .unwrap();

    let low = service.low_stock().await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].shortage, dec!(4));
}

#[tokio::test]
async fn movement_listing_filters_and_caps() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let (events, _rx) = event_channel();
    let service = StockService::new(db.clone(), events, 2);

    let product = Uuid::new_v4();
    for _ in 0..4 {
        service
            .stock_in(movement_request(&key, product, "V1", dec!(1)))
            .await
            .unwrap();
    }

    // Default limit comes from construction
    let movements = service
        .list_movements(MovementFilters::default())
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);

    let movements = service
        .list_movements(MovementFilters {
            limit: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(movements.len(), 3);

    let err = service
        .list_movements(MovementFilters {
            movement_type: Some("BOGUS".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
