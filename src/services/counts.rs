//! Inventory counts: a pending correction proposed by a physical count,
//! applied to the ledger on approval.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    inventory_count::{self, Entity as InventoryCountEntity},
    stock_item::{self, Entity as StockItemEntity},
    stock_movement::{self, MovementType},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::locations;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateInventoryCount {
    pub warehouse_id: Uuid,
    #[serde(default)]
    pub rack_group_id: Option<Uuid>,
    #[serde(default)]
    pub rack_level_id: Option<Uuid>,
    #[serde(default)]
    pub rack_slot_id: Option<Uuid>,
    pub product_id: Uuid,
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub variant_name: Option<String>,
    pub system_quantity: Decimal,
    pub counted_quantity: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

/// Service for inventory count lifecycle.
#[derive(Clone)]
pub struct InventoryCountService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryCountService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a pending count. The location may be partial (warehouse
    /// only), which yields a partial display address.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CreateInventoryCount,
    ) -> Result<inventory_count::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let full_address = locations::resolve_address(
            db,
            input.warehouse_id,
            input.rack_group_id,
            input.rack_level_id,
            input.rack_slot_id,
        )
        .await?;

        let difference = input.counted_quantity - input.system_quantity;
        let created = inventory_count::ActiveModel {
            warehouse_id: Set(input.warehouse_id),
            rack_group_id: Set(input.rack_group_id),
            rack_level_id: Set(input.rack_level_id),
            rack_slot_id: Set(input.rack_slot_id),
            product_id: Set(input.product_id),
            variant_id: Set(input.variant_id.unwrap_or_default()),
            variant_name: Set(input.variant_name),
            full_address: Set(Some(full_address)),
            system_quantity: Set(input.system_quantity),
            counted_quantity: Set(input.counted_quantity),
            difference: Set(difference),
            is_approved: Set(false),
            note: Set(input.note),
            approved_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(count_id = %created.id, difference = %created.difference, "Inventory count recorded");
        Ok(created)
    }

    /// Approves a pending count: overwrites the ledger quantity with the
    /// counted value (when the stock item still exists at that key), writes
    /// one ADJUST movement with the difference, and stamps the approval.
    /// A second approval attempt fails with Conflict.
    #[instrument(skip(self))]
    pub async fn approve(&self, count_id: Uuid) -> Result<Decimal, ServiceError> {
        let db = self.db_pool.as_ref();
        let (count, adjustment) = db
            .transaction::<_, (inventory_count::Model, Decimal), ServiceError>(move |txn| {
                Box::pin(async move {
                    let count = InventoryCountEntity::find_by_id(count_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Inventory count not found".to_string())
                        })?;

                    if count.is_approved {
                        return Err(ServiceError::Conflict("Already approved".to_string()));
                    }

                    // Locate the ledger row by the count's key; a count with
                    // an unspecified rack level can no longer match a row,
                    // and approval then records the correction without a
                    // ledger change.
                    let mut cond = Condition::all()
                        .add(stock_item::Column::WarehouseId.eq(count.warehouse_id))
                        .add(stock_item::Column::ProductId.eq(count.product_id));
                    cond = match count.rack_group_id {
                        Some(id) => cond.add(stock_item::Column::RackGroupId.eq(id)),
                        None => cond.add(stock_item::Column::RackGroupId.is_null()),
                    };
                    cond = match count.rack_level_id {
                        Some(id) => cond.add(stock_item::Column::RackLevelId.eq(id)),
                        None => cond.add(stock_item::Column::RackLevelId.is_null()),
                    };
                    cond = match count.rack_slot_id {
                        Some(id) => cond.add(stock_item::Column::RackSlotId.eq(id)),
                        None => cond.add(stock_item::Column::RackSlotId.is_null()),
                    };
                    cond = if count.variant_id.is_empty() {
                        cond.add(
                            Condition::any()
                                .add(stock_item::Column::VariantId.eq(""))
                                .add(stock_item::Column::VariantId.is_null()),
                        )
                    } else {
                        cond.add(stock_item::Column::VariantId.eq(count.variant_id.clone()))
                    };

                    if let Some(item) = StockItemEntity::find().filter(cond).one(txn).await? {
                        if count.counted_quantity < item.reserved_quantity {
                            return Err(ServiceError::InvalidState(format!(
                                "counted quantity {} is below reserved quantity {}",
                                count.counted_quantity, item.reserved_quantity
                            )));
                        }
                        let mut active: stock_item::ActiveModel = item.into();
                        active.quantity = Set(count.counted_quantity);
                        active.update(txn).await?;
                    }

                    stock_movement::ActiveModel {
                        movement_type: Set(MovementType::Adjust.as_str().to_string()),
                        warehouse_id: Set(count.warehouse_id),
                        rack_group_id: Set(count.rack_group_id),
                        rack_level_id: Set(count.rack_level_id),
                        rack_slot_id: Set(count.rack_slot_id),
                        target_warehouse_id: Set(None),
                        target_rack_group_id: Set(None),
                        target_rack_level_id: Set(None),
                        target_rack_slot_id: Set(None),
                        product_id: Set(count.product_id),
                        variant_id: Set(count.variant_id.clone()),
                        variant_name: Set(count.variant_name.clone()),
                        quantity: Set(count.difference),
                        source_address: Set(count.full_address.clone()),
                        target_address: Set(None),
                        reference: Set(None),
                        note: Set(Some(format!(
                            "Count correction: {} -> {}",
                            count.system_quantity, count.counted_quantity
                        ))),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let mut active: inventory_count::ActiveModel = count.clone().into();
                    active.is_approved = Set(true);
                    active.approved_at = Set(Some(chrono::Utc::now()));
                    let count = active.update(txn).await?;

                    let adjustment = count.difference;
                    Ok((count, adjustment))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(count_id = %count.id, %adjustment, "Inventory count approved");
        self.event_sender
            .send_or_log(Event::InventoryCountApproved {
                count_id: count.id,
                adjustment,
            })
            .await;

        Ok(adjustment)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        pending_only: bool,
    ) -> Result<Vec<inventory_count::Model>, ServiceError> {
        let mut query = InventoryCountEntity::find();
        if pending_only {
            query = query.filter(inventory_count::Column::IsApproved.eq(false));
        }
        Ok(query
            .order_by_desc(inventory_count::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, count_id: Uuid) -> Result<inventory_count::Model, ServiceError> {
        InventoryCountEntity::find_by_id(count_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Inventory count not found".to_string()))
    }
}
