//! Shared test harness: an isolated in-memory database per test plus
//! seed helpers for the location tree and quotations.
#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use stockroom_api::db::{establish_connection_with_config, run_migrations, DbConfig};
use stockroom_api::entities::{quotation, quotation_line};
use stockroom_api::events::{Event, EventSender};
use stockroom_api::services::locations::{
    CreateRackGroup, CreateRackLevel, CreateRackSlot, CreateWarehouse, LocationKey,
    LocationService,
};
use stockroom_api::services::stock::StockMovementRequest;

/// One private in-memory database per call. A single pooled connection is
/// required: every sqlite :memory: connection is its own database.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        connect_timeout: Duration::from_secs(5),
        idle_timeout: Duration::from_secs(600),
        acquire_timeout: Duration::from_secs(5),
    };
    let db = establish_connection_with_config(&config)
        .await
        .expect("Failed to open in-memory database");
    run_migrations(&db).await.expect("Failed to run migrations");
    Arc::new(db)
}

pub fn event_channel() -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(256);
    (EventSender::new(tx), rx)
}

/// Creates warehouse "Main" (code "MN") with rack group "A", level 1,
/// slot 1 and returns the slot-level location key.
pub async fn seed_location(db: Arc<DatabaseConnection>) -> LocationKey {
    seed_named_location(db, "Main", "MN", "A", 1, 1).await
}

pub async fn seed_named_location(
    db: Arc<DatabaseConnection>,
    warehouse_name: &str,
    warehouse_code: &str,
    group_code: &str,
    level_number: i32,
    slot_number: i32,
) -> LocationKey {
    let locations = LocationService::new(db);

    let warehouse = locations
        .create_warehouse(CreateWarehouse {
            name: warehouse_name.to_string(),
            code: warehouse_code.to_string(),
            address: None,
            description: None,
        })
        .await
        .expect("create warehouse");

    let group = locations
        .create_rack_group(CreateRackGroup {
            warehouse_id: warehouse.id,
            name: group_code.to_string(),
            code: group_code.to_string(),
            description: None,
        })
        .await
        .expect("create rack group");

    let level = locations
        .create_rack_level(CreateRackLevel {
            rack_group_id: group.id,
            level_number,
            name: None,
        })
        .await
        .expect("create rack level");

    let slot = locations
        .create_rack_slot(CreateRackSlot {
            rack_level_id: level.id,
            slot_number,
            name: None,
        })
        .await
        .expect("create rack slot");

    LocationKey {
        warehouse_id: warehouse.id,
        rack_group_id: group.id,
        rack_level_id: level.id,
        rack_slot_id: slot.id,
    }
}

/// A second slot on the same level, for transfer targets.
pub async fn seed_sibling_slot(db: Arc<DatabaseConnection>, key: &LocationKey, slot_number: i32) -> LocationKey {
    let locations = LocationService::new(db);
    let slot = locations
        .create_rack_slot(CreateRackSlot {
            rack_level_id: key.rack_level_id,
            slot_number,
            name: None,
        })
        .await
        .expect("create sibling slot");

    LocationKey {
        rack_slot_id: slot.id,
        ..*key
    }
}

pub fn movement_request(
    key: &LocationKey,
    product_id: Uuid,
    variant_id: &str,
    quantity: Decimal,
) -> StockMovementRequest {
    StockMovementRequest {
        warehouse_id: key.warehouse_id,
        rack_group_id: key.rack_group_id,
        rack_level_id: key.rack_level_id,
        rack_slot_id: key.rack_slot_id,
        product_id,
        variant_id: Some(variant_id.to_string()),
        variant_name: None,
        variant_sku: None,
        quantity,
        target_warehouse_id: None,
        target_rack_group_id: None,
        target_rack_level_id: None,
        target_rack_slot_id: None,
        reference: None,
        note: None,
    }
}

pub fn transfer_request(
    source: &LocationKey,
    target: &LocationKey,
    product_id: Uuid,
    variant_id: &str,
    quantity: Decimal,
) -> StockMovementRequest {
    let mut request = movement_request(source, product_id, variant_id, quantity);
    request.target_warehouse_id = Some(target.warehouse_id);
    request.target_rack_group_id = Some(target.rack_group_id);
    request.target_rack_level_id = Some(target.rack_level_id);
    request.target_rack_slot_id = Some(target.rack_slot_id);
    request
}

/// Seeds a quotation with one non-optional line and returns (quotation id,
/// line id).
pub async fn seed_quotation(
    db: &DatabaseConnection,
    number: &str,
    product_id: Uuid,
    variant_id: &str,
    quantity: Decimal,
) -> (Uuid, Uuid) {
    let quotation = quotation::ActiveModel {
        number: Set(number.to_string()),
        offer_status: Set("pending".to_string()),
        delivery_status: Set("pending".to_string()),
        rejection_reason: Set(None),
        delivered_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert quotation");

    let line = quotation_line::ActiveModel {
        quotation_id: Set(quotation.id),
        product_id: Set(Some(product_id)),
        variant_id: Set(Some(variant_id.to_string())),
        model_name: Set(None),
        quantity: Set(quantity),
        is_optional: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert quotation line");

    (quotation.id, line.id)
}

pub async fn add_quotation_line(
    db: &DatabaseConnection,
    quotation_id: Uuid,
    product_id: Option<Uuid>,
    variant_id: Option<&str>,
    quantity: Decimal,
    is_optional: bool,
) -> Uuid {
    let line = quotation_line::ActiveModel {
        quotation_id: Set(quotation_id),
        product_id: Set(product_id),
        variant_id: Set(variant_id.map(str::to_string)),
        model_name: Set(None),
        quantity: Set(quantity),
        is_optional: Set(is_optional),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert quotation line");
    line.id
}
