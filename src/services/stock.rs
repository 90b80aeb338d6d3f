//! The stock ledger: authoritative on-hand/reserved quantity per
//! (location, product, variant) key, plus the append-only movement log.
//!
//! Every mutation runs in one transaction and appends exactly one movement
//! per logical ledger change; a transfer is a single entry carrying both
//! addresses. Reserved stock is never eligible for stock-out or transfer.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    stock_item::{self, Entity as StockItemEntity},
    stock_movement::{self, Entity as StockMovementEntity, MovementType},
    stock_reservation::{self, Entity as StockReservationEntity, ReservationStatus},
    warehouse::Entity as WarehouseEntity,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::locations::{self, LocationKey};

/// Hard cap for movement listings, whatever the caller asks for.
pub const MOVEMENT_LIST_CAP: u64 = 500;

/// Flat request body shared by stock in/out/transfer, mirroring the wire
/// shape the warehouse UI sends. The target fields only matter for
/// transfers.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StockMovementRequest {
    pub warehouse_id: Uuid,
    pub rack_group_id: Uuid,
    pub rack_level_id: Uuid,
    pub rack_slot_id: Uuid,
    pub product_id: Uuid,
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub variant_name: Option<String>,
    #[serde(default)]
    pub variant_sku: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub target_warehouse_id: Option<Uuid>,
    #[serde(default)]
    pub target_rack_group_id: Option<Uuid>,
    #[serde(default)]
    pub target_rack_level_id: Option<Uuid>,
    #[serde(default)]
    pub target_rack_slot_id: Option<Uuid>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl StockMovementRequest {
    fn location(&self) -> LocationKey {
        LocationKey {
            warehouse_id: self.warehouse_id,
            rack_group_id: self.rack_group_id,
            rack_level_id: self.rack_level_id,
            rack_slot_id: self.rack_slot_id,
        }
    }

    fn target_location(&self) -> Option<LocationKey> {
        Some(LocationKey {
            warehouse_id: self.target_warehouse_id?,
            rack_group_id: self.target_rack_group_id?,
            rack_level_id: self.target_rack_level_id?,
            rack_slot_id: self.target_rack_slot_id?,
        })
    }

    /// Normalized variant key; the empty string is the "no variant" key.
    fn variant_key(&self) -> String {
        self.variant_id.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct StockFilters {
    pub warehouse_id: Option<Uuid>,
    pub rack_group_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<String>,
    #[serde(default)]
    pub low_stock_only: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct MovementFilters {
    pub warehouse_id: Option<Uuid>,
    pub movement_type: Option<String>,
    pub limit: Option<u64>,
}

/// Totals per product+variant across all or one warehouse.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockSummaryRow {
    pub product_id: Uuid,
    pub variant_id: String,
    pub variant_name: Option<String>,
    pub variant_sku: Option<String>,
    pub total_quantity: Decimal,
    pub total_reserved: Decimal,
    pub available_quantity: Decimal,
    pub locations_count: u64,
    pub min_stock: Decimal,
    pub is_low_stock: bool,
    pub locations: Vec<String>,
}

/// Product+variant totals that fell to or below their reorder threshold.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LowStockRow {
    pub product_id: Uuid,
    pub variant_id: String,
    pub variant_name: Option<String>,
    pub total_quantity: Decimal,
    pub min_stock: Decimal,
    pub shortage: Decimal,
}

/// Stock totals per warehouse.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WarehouseStockReport {
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub total_items: u64,
    pub total_quantity: Decimal,
    pub total_reserved: Decimal,
}

/// Outcome of a transfer: both ledger rows after the move.
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub source: stock_item::Model,
    pub target: stock_item::Model,
    pub from_address: String,
    pub to_address: String,
}

/// Matches stock items at one location under the empty-or-null variant
/// equivalence: an empty key matches both NULL and `""`.
pub(crate) fn location_variant_condition(key: &LocationKey, variant_key: &str) -> Condition {
    let cond = Condition::all()
        .add(stock_item::Column::WarehouseId.eq(key.warehouse_id))
        .add(stock_item::Column::RackGroupId.eq(key.rack_group_id))
        .add(stock_item::Column::RackLevelId.eq(key.rack_level_id))
        .add(stock_item::Column::RackSlotId.eq(key.rack_slot_id));
    if variant_key.is_empty() {
        cond.add(
            Condition::any()
                .add(stock_item::Column::VariantId.eq(""))
                .add(stock_item::Column::VariantId.is_null()),
        )
    } else {
        cond.add(stock_item::Column::VariantId.eq(variant_key))
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn movement_row(
    movement_type: MovementType,
    source: &LocationKey,
    target: Option<&LocationKey>,
    product_id: Uuid,
    variant_id: String,
    variant_name: Option<String>,
    quantity: Decimal,
    source_address: Option<String>,
    target_address: Option<String>,
    reference: Option<String>,
    note: Option<String>,
) -> stock_movement::ActiveModel {
    stock_movement::ActiveModel {
        movement_type: Set(movement_type.as_str().to_string()),
        warehouse_id: Set(source.warehouse_id),
        rack_group_id: Set(Some(source.rack_group_id)),
        rack_level_id: Set(Some(source.rack_level_id)),
        rack_slot_id: Set(Some(source.rack_slot_id)),
        target_warehouse_id: Set(target.map(|t| t.warehouse_id)),
        target_rack_group_id: Set(target.map(|t| t.rack_group_id)),
        target_rack_level_id: Set(target.map(|t| t.rack_level_id)),
        target_rack_slot_id: Set(target.map(|t| t.rack_slot_id)),
        product_id: Set(product_id),
        variant_id: Set(variant_id),
        variant_name: Set(variant_name),
        quantity: Set(quantity),
        source_address: Set(source_address),
        target_address: Set(target_address),
        reference: Set(reference),
        note: Set(note),
        ..Default::default()
    }
}

/// Service for the stock ledger and movement log.
#[derive(Clone)]
pub struct StockService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    default_movement_limit: u64,
}

impl StockService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        event_sender: EventSender,
        default_movement_limit: u64,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            default_movement_limit,
        }
    }

    /// Adds stock to a location, creating the ledger row on first stock-in.
    #[instrument(skip(self, request))]
    pub async fn stock_in(
        &self,
        request: StockMovementRequest,
    ) -> Result<stock_item::Model, ServiceError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let received_quantity = request.quantity;
        let db = self.db_pool.as_ref();
        let item = db
            .transaction::<_, stock_item::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let location = request.location();
                    let variant_key = request.variant_key();

                    let full_address = locations::resolve_address(
                        txn,
                        location.warehouse_id,
                        Some(location.rack_group_id),
                        Some(location.rack_level_id),
                        Some(location.rack_slot_id),
                    )
                    .await?;

                    let existing = StockItemEntity::find()
                        .filter(location_variant_condition(&location, &variant_key))
                        .filter(stock_item::Column::ProductId.eq(request.product_id))
                        .one(txn)
                        .await?;

                    let item = match existing {
                        Some(item) => {
                            let new_quantity = item.quantity + request.quantity;
                            let mut active: stock_item::ActiveModel = item.into();
                            active.quantity = Set(new_quantity);
                            active.update(txn).await?
                        }
                        None => {
                            stock_item::ActiveModel {
                                warehouse_id: Set(location.warehouse_id),
                                rack_group_id: Set(location.rack_group_id),
                                rack_level_id: Set(location.rack_level_id),
                                rack_slot_id: Set(location.rack_slot_id),
                                product_id: Set(request.product_id),
                                variant_id: Set(variant_key.clone()),
                                variant_name: Set(request.variant_name.clone()),
                                variant_sku: Set(request.variant_sku.clone()),
                                quantity: Set(request.quantity),
                                reserved_quantity: Set(Decimal::ZERO),
                                min_stock: Set(Decimal::ZERO),
                                full_address: Set(Some(full_address.clone())),
                                ..Default::default()
                            }
                            .insert(txn)
                            .await?
                        }
                    };

                    movement_row(
                        MovementType::In,
                        &location,
                        None,
                        request.product_id,
                        variant_key,
                        request.variant_name.clone(),
                        request.quantity,
                        Some(full_address),
                        None,
                        request.reference.clone(),
                        request.note.clone(),
                    )
                    .insert(txn)
                    .await?;

                    Ok(item)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(stock_item_id = %item.id, quantity = %received_quantity, "Stock received");
        self.event_sender
            .send_or_log(Event::StockReceived {
                stock_item_id: item.id,
                product_id: item.product_id,
                variant_id: item.variant_id.clone(),
                quantity: received_quantity,
            })
            .await;

        Ok(item)
    }

    /// Removes stock from a location. Reserved quantity is untouchable:
    /// only `quantity - reserved_quantity` can leave this way.
    #[instrument(skip(self, request))]
    pub async fn stock_out(
        &self,
        request: StockMovementRequest,
    ) -> Result<stock_item::Model, ServiceError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let issued_quantity = request.quantity;
        let db = self.db_pool.as_ref();
        let item = db
            .transaction::<_, stock_item::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let location = request.location();
                    let variant_key = request.variant_key();

                    let item = StockItemEntity::find()
                        .filter(location_variant_condition(&location, &variant_key))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Stock not found at this location".to_string())
                        })?;

                    let available = item.available();
                    if request.quantity > available {
                        return Err(ServiceError::InsufficientStock(format!(
                            "on hand: {}, reserved: {}, available: {}, requested: {}",
                            item.quantity, item.reserved_quantity, available, request.quantity
                        )));
                    }

                    let new_quantity = item.quantity - request.quantity;
                    let full_address = locations::resolve_address(
                        txn,
                        location.warehouse_id,
                        Some(location.rack_group_id),
                        Some(location.rack_level_id),
                        Some(location.rack_slot_id),
                    )
                    .await?;

                    let product_id = item.product_id;
                    let mut active: stock_item::ActiveModel = item.into();
                    active.quantity = Set(new_quantity);
                    let item = active.update(txn).await?;

                    movement_row(
                        MovementType::Out,
                        &location,
                        None,
                        product_id,
                        variant_key,
                        request.variant_name.clone(),
                        -request.quantity,
                        Some(full_address),
                        None,
                        request.reference.clone(),
                        request.note.clone(),
                    )
                    .insert(txn)
                    .await?;

                    Ok(item)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(stock_item_id = %item.id, remaining = %item.quantity, "Stock issued");
        self.event_sender
            .send_or_log(Event::StockIssued {
                stock_item_id: item.id,
                product_id: item.product_id,
                variant_id: item.variant_id.clone(),
                quantity: issued_quantity,
            })
            .await;

        Ok(item)
    }

    /// Moves stock between two locations in one transaction; exactly one
    /// TRANSFER movement records both addresses. Quantity is conserved.
    #[instrument(skip(self, request))]
    pub async fn stock_transfer(
        &self,
        request: StockMovementRequest,
    ) -> Result<TransferResult, ServiceError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        let target = request.target_location().ok_or_else(|| {
            ServiceError::ValidationError("Target location required for transfer".to_string())
        })?;

        let transferred_quantity = request.quantity;
        let db = self.db_pool.as_ref();
        let result = db
            .transaction::<_, TransferResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let source = request.location();
                    let variant_key = request.variant_key();

                    let source_item = StockItemEntity::find()
                        .filter(location_variant_condition(&source, &variant_key))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Source stock not found".to_string())
                        })?;

                    // Reserved stock is pinned to its location until the
                    // reservation is released or delivered.
                    let available = source_item.available();
                    if request.quantity > available {
                        return Err(ServiceError::InsufficientStock(format!(
                            "on hand: {}, reserved: {}, available: {}, requested: {}",
                            source_item.quantity,
                            source_item.reserved_quantity,
                            available,
                            request.quantity
                        )));
                    }

                    let source_address = locations::resolve_address(
                        txn,
                        source.warehouse_id,
                        Some(source.rack_group_id),
                        Some(source.rack_level_id),
                        Some(source.rack_slot_id),
                    )
                    .await?;
                    let target_address = locations::resolve_address(
                        txn,
                        target.warehouse_id,
                        Some(target.rack_group_id),
                        Some(target.rack_level_id),
                        Some(target.rack_slot_id),
                    )
                    .await?;

                    let new_source_quantity = source_item.quantity - request.quantity;
                    let product_id = source_item.product_id;
                    let variant_name = source_item.variant_name.clone();
                    let variant_sku = source_item.variant_sku.clone();

                    let mut active_source: stock_item::ActiveModel = source_item.into();
                    active_source.quantity = Set(new_source_quantity);
                    let source_item = active_source.update(txn).await?;

                    let target_item = StockItemEntity::find()
                        .filter(location_variant_condition(&target, &variant_key))
                        .one(txn)
                        .await?;

                    let target_item = match target_item {
                        Some(item) => {
                            let new_quantity = item.quantity + request.quantity;
                            let mut active: stock_item::ActiveModel = item.into();
                            active.quantity = Set(new_quantity);
                            active.update(txn).await?
                        }
                        None => {
                            stock_item::ActiveModel {
                                warehouse_id: Set(target.warehouse_id),
                                rack_group_id: Set(target.rack_group_id),
                                rack_level_id: Set(target.rack_level_id),
                                rack_slot_id: Set(target.rack_slot_id),
                                product_id: Set(product_id),
                                variant_id: Set(variant_key.clone()),
                                variant_name: Set(variant_name.clone()),
                                variant_sku: Set(variant_sku),
                                quantity: Set(request.quantity),
                                reserved_quantity: Set(Decimal::ZERO),
                                min_stock: Set(Decimal::ZERO),
                                full_address: Set(Some(target_address.clone())),
                                ..Default::default()
                            }
                            .insert(txn)
                            .await?
                        }
                    };

                    movement_row(
                        MovementType::Transfer,
                        &source,
                        Some(&target),
                        product_id,
                        variant_key,
                        variant_name,
                        request.quantity,
                        Some(source_address.clone()),
                        Some(target_address.clone()),
                        request.reference.clone(),
                        request.note.clone(),
                    )
                    .insert(txn)
                    .await?;

                    Ok(TransferResult {
                        source: source_item,
                        target: target_item,
                        from_address: source_address,
                        to_address: target_address,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            source = %result.source.id,
            target = %result.target.id,
            "Stock transferred"
        );
        self.event_sender
            .send_or_log(Event::StockTransferred {
                source_stock_item_id: result.source.id,
                target_stock_item_id: result.target.id,
                product_id: result.source.product_id,
                variant_id: result.source.variant_id.clone(),
                quantity: transferred_quantity,
            })
            .await;

        Ok(result)
    }

    /// Overwrites the on-hand quantity of a ledger row (manual correction).
    /// The new quantity may not undercut the reserved quantity.
    #[instrument(skip(self))]
    pub async fn adjust_quantity(
        &self,
        stock_id: Uuid,
        new_quantity: Decimal,
        note: Option<String>,
    ) -> Result<(Decimal, stock_item::Model), ServiceError> {
        if new_quantity < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quantity cannot be negative".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let (old_quantity, item) = db
            .transaction::<_, (Decimal, stock_item::Model), ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = StockItemEntity::find_by_id(stock_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Stock item not found".to_string())
                        })?;

                    if new_quantity < item.reserved_quantity {
                        return Err(ServiceError::InvalidState(format!(
                            "new quantity {} is below reserved quantity {}",
                            new_quantity, item.reserved_quantity
                        )));
                    }

                    let old_quantity = item.quantity;
                    let difference = new_quantity - old_quantity;
                    let location = LocationKey {
                        warehouse_id: item.warehouse_id,
                        rack_group_id: item.rack_group_id,
                        rack_level_id: item.rack_level_id,
                        rack_slot_id: item.rack_slot_id,
                    };
                    let product_id = item.product_id;
                    let variant_id = item.variant_id.clone();
                    let variant_name = item.variant_name.clone();
                    let full_address = item.full_address.clone();

                    let mut active: stock_item::ActiveModel = item.into();
                    active.quantity = Set(new_quantity);
                    let item = active.update(txn).await?;

                    movement_row(
                        MovementType::Adjustment,
                        &location,
                        None,
                        product_id,
                        variant_id,
                        variant_name,
                        difference,
                        full_address,
                        None,
                        Some(format!(
                            "Manual adjustment: {} -> {}",
                            old_quantity, new_quantity
                        )),
                        note.clone()
                            .filter(|n| !n.is_empty())
                            .or_else(|| Some("Stock quantity manually adjusted".to_string())),
                    )
                    .insert(txn)
                    .await?;

                    Ok((old_quantity, item))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send_or_log(Event::StockAdjusted {
                stock_item_id: item.id,
                old_quantity,
                new_quantity: item.quantity,
            })
            .await;

        Ok((old_quantity, item))
    }

    /// Removes a ledger row permanently, logging one DELETE movement with
    /// the full negative quantity first. Refused while reservations still
    /// reference the row.
    #[instrument(skip(self))]
    pub async fn delete_stock_item(&self, stock_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let (product_id, quantity, item_id) = db
            .transaction::<_, (Uuid, Decimal, Uuid), ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = StockItemEntity::find_by_id(stock_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Stock item not found".to_string())
                        })?;

                    let held = StockReservationEntity::find()
                        .filter(stock_reservation::Column::StockItemId.eq(stock_id))
                        .filter(
                            stock_reservation::Column::Status
                                .ne(ReservationStatus::Released.as_str()),
                        )
                        .one(txn)
                        .await?;
                    if held.is_some() {
                        return Err(ServiceError::Conflict(
                            "Stock item has reservations".to_string(),
                        ));
                    }

                    let location = LocationKey {
                        warehouse_id: item.warehouse_id,
                        rack_group_id: item.rack_group_id,
                        rack_level_id: item.rack_level_id,
                        rack_slot_id: item.rack_slot_id,
                    };

                    movement_row(
                        MovementType::Delete,
                        &location,
                        None,
                        item.product_id,
                        item.variant_id.clone(),
                        item.variant_name.clone(),
                        -item.quantity,
                        item.full_address.clone(),
                        None,
                        Some("Stock item deleted".to_string()),
                        Some(format!("Deleted quantity: {}", item.quantity)),
                    )
                    .insert(txn)
                    .await?;

                    let product_id = item.product_id;
                    let quantity = item.quantity;
                    let item_id = item.id;
                    item.delete(txn).await?;

                    Ok((product_id, quantity, item_id))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(stock_item_id = %item_id, "Stock item deleted");
        self.event_sender
            .send_or_log(Event::StockDeleted {
                stock_item_id: item_id,
                product_id,
                quantity,
            })
            .await;

        Ok(())
    }

    // ---- queries ----

    #[instrument(skip(self))]
    pub async fn get_stock_item(&self, stock_id: Uuid) -> Result<stock_item::Model, ServiceError> {
        StockItemEntity::find_by_id(stock_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Stock item not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_stock(
        &self,
        filters: StockFilters,
    ) -> Result<Vec<stock_item::Model>, ServiceError> {
        let mut query = StockItemEntity::find();
        if let Some(warehouse_id) = filters.warehouse_id {
            query = query.filter(stock_item::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(rack_group_id) = filters.rack_group_id {
            query = query.filter(stock_item::Column::RackGroupId.eq(rack_group_id));
        }
        if let Some(product_id) = filters.product_id {
            query = query.filter(stock_item::Column::ProductId.eq(product_id));
        }
        if let Some(variant_id) = filters.variant_id {
            query = query.filter(stock_item::Column::VariantId.eq(variant_id));
        }

        let mut items = query
            .order_by_asc(stock_item::Column::FullAddress)
            .all(self.db_pool.as_ref())
            .await?;

        if filters.low_stock_only {
            items.retain(|item| item.quantity <= item.min_stock);
        }

        Ok(items)
    }

    /// Stock totals grouped by product+variant, optionally scoped to one
    /// warehouse. Grouping happens in memory; the ledger for one warehouse
    /// is small and the rows were already needed for addresses.
    #[instrument(skip(self))]
    pub async fn stock_summary(
        &self,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<StockSummaryRow>, ServiceError> {
        let mut query = StockItemEntity::find();
        if let Some(warehouse_id) = warehouse_id {
            query = query.filter(stock_item::Column::WarehouseId.eq(warehouse_id));
        }
        let items = query.all(self.db_pool.as_ref()).await?;

        let mut grouped: BTreeMap<(Uuid, String), StockSummaryRow> = BTreeMap::new();
        for item in items {
            let entry = grouped
                .entry((item.product_id, item.variant_id.clone()))
                .or_insert_with(|| StockSummaryRow {
                    product_id: item.product_id,
                    variant_id: item.variant_id.clone(),
                    variant_name: item.variant_name.clone(),
                    variant_sku: item.variant_sku.clone(),
                    total_quantity: Decimal::ZERO,
                    total_reserved: Decimal::ZERO,
                    available_quantity: Decimal::ZERO,
                    locations_count: 0,
                    min_stock: Decimal::ZERO,
                    is_low_stock: false,
                    locations: Vec::new(),
                });
            entry.total_quantity += item.quantity;
            entry.total_reserved += item.reserved_quantity;
            entry.locations_count += 1;
            if item.min_stock > entry.min_stock {
                entry.min_stock = item.min_stock;
            }
            if let Some(address) = item.full_address {
                entry.locations.push(address);
            }
        }

        let mut rows: Vec<StockSummaryRow> = grouped.into_values().collect();
        for row in &mut rows {
            row.available_quantity = row.total_quantity - row.total_reserved;
            row.is_low_stock = row.total_quantity <= row.min_stock;
        }
        Ok(rows)
    }

    /// Product+variant totals at or below their reorder threshold.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<LowStockRow>, ServiceError> {
        let rows = self.stock_summary(None).await?;
        Ok(rows
            .into_iter()
            .filter(|row| row.is_low_stock)
            .map(|row| LowStockRow {
                product_id: row.product_id,
                variant_id: row.variant_id,
                variant_name: row.variant_name,
                total_quantity: row.total_quantity,
                min_stock: row.min_stock,
                shortage: row.min_stock - row.total_quantity,
            })
            .collect())
    }

    /// Stock totals per warehouse, with warehouse names resolved.
    #[instrument(skip(self))]
    pub async fn report_by_warehouse(&self) -> Result<Vec<WarehouseStockReport>, ServiceError> {
        let db = self.db_pool.as_ref();
        let items = StockItemEntity::find().all(db).await?;

        let mut grouped: BTreeMap<Uuid, WarehouseStockReport> = BTreeMap::new();
        for item in items {
            let entry = grouped
                .entry(item.warehouse_id)
                .or_insert_with(|| WarehouseStockReport {
                    warehouse_id: item.warehouse_id,
                    warehouse_name: String::new(),
                    total_items: 0,
                    total_quantity: Decimal::ZERO,
                    total_reserved: Decimal::ZERO,
                });
            entry.total_items += 1;
            entry.total_quantity += item.quantity;
            entry.total_reserved += item.reserved_quantity;
        }

        let mut rows: Vec<WarehouseStockReport> = grouped.into_values().collect();
        for row in &mut rows {
            if let Some(wh) = WarehouseEntity::find_by_id(row.warehouse_id).one(db).await? {
                row.warehouse_name = wh.name;
            }
        }
        Ok(rows)
    }

    /// Movement log, reverse-chronological. The limit is an operational
    /// bound, not a correctness invariant.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        filters: MovementFilters,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let mut query = StockMovementEntity::find();
        if let Some(warehouse_id) = filters.warehouse_id {
            query = query.filter(stock_movement::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(movement_type) = &filters.movement_type {
            let parsed = MovementType::from_str(movement_type).ok_or_else(|| {
                ServiceError::ValidationError(format!("Unknown movement type: {}", movement_type))
            })?;
            query = query.filter(stock_movement::Column::MovementType.eq(parsed.as_str()));
        }

        let limit = filters
            .limit
            .unwrap_or(self.default_movement_limit)
            .clamp(1, MOVEMENT_LIST_CAP);

        Ok(query
            .order_by_desc(stock_movement::Column::CreatedAt)
            .limit(limit)
            .all(self.db_pool.as_ref())
            .await?)
    }
}
