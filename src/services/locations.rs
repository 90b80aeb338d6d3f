//! Location hierarchy: warehouses, rack groups, rack levels, rack slots.
//!
//! Warehouse codes are unique among non-deleted warehouses; rack-group codes
//! are unique within their warehouse. Deletion is soft everywhere (hard
//! delete is an explicit warehouse option) and is refused while stock still
//! sits in the subtree.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{
    rack_group::{self, Entity as RackGroupEntity},
    rack_level::{self, Entity as RackLevelEntity},
    rack_slot::{self, Entity as RackSlotEntity},
    stock_item::{self, Entity as StockItemEntity},
    warehouse::{self, Entity as WarehouseEntity},
};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWarehouse {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub code: String,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateWarehouse {
    pub name: Option<String>,
    pub code: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRackGroup {
    pub warehouse_id: Uuid,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRackGroup {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRackLevel {
    pub rack_group_id: Uuid,
    pub level_number: i32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRackLevel {
    pub level_number: Option<i32>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRackSlot {
    pub rack_level_id: Uuid,
    pub slot_number: i32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRackSlot {
    pub slot_number: Option<i32>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Identifies one slot-level location. Used by the stock operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LocationKey {
    pub warehouse_id: Uuid,
    pub rack_group_id: Uuid,
    pub rack_level_id: Uuid,
    pub rack_slot_id: Uuid,
}

/// Builds the human-readable address for a (possibly partial) location key.
/// Missing levels are silently skipped: partial addresses are legal during
/// inventory counts where group/level/slot may be unspecified.
pub async fn resolve_address<C: ConnectionTrait>(
    db: &C,
    warehouse_id: Uuid,
    rack_group_id: Option<Uuid>,
    rack_level_id: Option<Uuid>,
    rack_slot_id: Option<Uuid>,
) -> Result<String, ServiceError> {
    let mut parts: Vec<String> = Vec::with_capacity(4);

    if let Some(wh) = WarehouseEntity::find_by_id(warehouse_id).one(db).await? {
        parts.push(wh.name);
    }

    if let Some(group_id) = rack_group_id {
        if let Some(group) = RackGroupEntity::find_by_id(group_id).one(db).await? {
            parts.push(group.name);
        }
    }

    if let Some(level_id) = rack_level_id {
        if let Some(level) = RackLevelEntity::find_by_id(level_id).one(db).await? {
            let name = level
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("{}. level", level.level_number));
            parts.push(name);
        }
    }

    if let Some(slot_id) = rack_slot_id {
        if let Some(slot) = RackSlotEntity::find_by_id(slot_id).one(db).await? {
            let name = slot
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Slot {}", slot.slot_number));
            parts.push(name);
        }
    }

    Ok(parts.join(" / "))
}

/// True when any stock item under the given scope still holds on-hand or
/// reserved quantity. Location deletion is refused while this holds.
async fn scope_holds_stock<C: ConnectionTrait>(
    db: &C,
    scope: Condition,
) -> Result<bool, ServiceError> {
    let occupied = StockItemEntity::find()
        .filter(scope)
        .filter(
            Condition::any()
                .add(stock_item::Column::Quantity.ne(rust_decimal::Decimal::ZERO))
                .add(stock_item::Column::ReservedQuantity.ne(rust_decimal::Decimal::ZERO)),
        )
        .one(db)
        .await?;
    Ok(occupied.is_some())
}

/// Service for the warehouse location tree.
#[derive(Clone)]
pub struct LocationService {
    db_pool: Arc<DatabaseConnection>,
}

impl LocationService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    /// Resolves the display address for a full slot-level key.
    pub async fn full_address(&self, key: &LocationKey) -> Result<String, ServiceError> {
        resolve_address(
            self.db_pool.as_ref(),
            key.warehouse_id,
            Some(key.rack_group_id),
            Some(key.rack_level_id),
            Some(key.rack_slot_id),
        )
        .await
    }

    // ---- warehouses ----

    #[instrument(skip(self))]
    pub async fn list_warehouses(
        &self,
        include_deleted: bool,
    ) -> Result<Vec<warehouse::Model>, ServiceError> {
        let mut query = WarehouseEntity::find();
        if !include_deleted {
            query = query.filter(warehouse::Column::IsDeleted.eq(false));
        }
        Ok(query
            .order_by_asc(warehouse::Column::Name)
            .all(self.db_pool.as_ref())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_warehouse(&self, warehouse_id: Uuid) -> Result<warehouse::Model, ServiceError> {
        WarehouseEntity::find_by_id(warehouse_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Warehouse not found".to_string()))
    }

    #[instrument(skip(self, input))]
    pub async fn create_warehouse(
        &self,
        input: CreateWarehouse,
    ) -> Result<warehouse::Model, ServiceError> {
        input.validate()?;
        let db = self.db_pool.as_ref();

        let existing = WarehouseEntity::find()
            .filter(warehouse::Column::Code.eq(input.code.clone()))
            .filter(warehouse::Column::IsDeleted.eq(false))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "Warehouse code already exists".to_string(),
            ));
        }

        let created = warehouse::ActiveModel {
            name: Set(input.name),
            code: Set(input.code),
            address: Set(input.address),
            description: Set(input.description),
            is_active: Set(true),
            is_deleted: Set(false),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(warehouse_id = %created.id, code = %created.code, "Created warehouse");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_warehouse(
        &self,
        warehouse_id: Uuid,
        input: UpdateWarehouse,
    ) -> Result<warehouse::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_warehouse(warehouse_id).await?;

        if let Some(code) = &input.code {
            let clash = WarehouseEntity::find()
                .filter(warehouse::Column::Code.eq(code.clone()))
                .filter(warehouse::Column::IsDeleted.eq(false))
                .filter(warehouse::Column::Id.ne(warehouse_id))
                .one(db)
                .await?;
            if clash.is_some() {
                return Err(ServiceError::Conflict(
                    "Warehouse code already exists".to_string(),
                ));
            }
        }

        let mut active: warehouse::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        Ok(active.update(db).await?)
    }

    /// Soft-deletes a warehouse; `hard` removes the row entirely. Both are
    /// refused while stock remains anywhere in the warehouse.
    #[instrument(skip(self))]
    pub async fn delete_warehouse(&self, warehouse_id: Uuid, hard: bool) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_warehouse(warehouse_id).await?;

        let scope = Condition::all().add(stock_item::Column::WarehouseId.eq(warehouse_id));
        if scope_holds_stock(db, scope).await? {
            return Err(ServiceError::Conflict(
                "Warehouse still holds stock".to_string(),
            ));
        }

        if hard {
            WarehouseEntity::delete_by_id(warehouse_id).exec(db).await?;
        } else {
            let mut active: warehouse::ActiveModel = existing.into();
            active.is_deleted = Set(true);
            active.update(db).await?;
        }
        info!(%warehouse_id, hard, "Deleted warehouse");
        Ok(())
    }

    // ---- rack groups ----

    #[instrument(skip(self))]
    pub async fn list_rack_groups(
        &self,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<rack_group::Model>, ServiceError> {
        let mut query = RackGroupEntity::find().filter(rack_group::Column::IsDeleted.eq(false));
        if let Some(warehouse_id) = warehouse_id {
            query = query.filter(rack_group::Column::WarehouseId.eq(warehouse_id));
        }
        Ok(query
            .order_by_asc(rack_group::Column::Code)
            .all(self.db_pool.as_ref())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_rack_group(
        &self,
        rack_group_id: Uuid,
    ) -> Result<rack_group::Model, ServiceError> {
        RackGroupEntity::find_by_id(rack_group_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Rack group not found".to_string()))
    }

    #[instrument(skip(self, input))]
    pub async fn create_rack_group(
        &self,
        input: CreateRackGroup,
    ) -> Result<rack_group::Model, ServiceError> {
        input.validate()?;
        let db = self.db_pool.as_ref();

        self.get_warehouse(input.warehouse_id).await?;

        let existing = RackGroupEntity::find()
            .filter(rack_group::Column::WarehouseId.eq(input.warehouse_id))
            .filter(rack_group::Column::Code.eq(input.code.clone()))
            .filter(rack_group::Column::IsDeleted.eq(false))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "Rack group code already exists in this warehouse".to_string(),
            ));
        }

        let created = rack_group::ActiveModel {
            warehouse_id: Set(input.warehouse_id),
            name: Set(input.name),
            code: Set(input.code),
            description: Set(input.description),
            is_active: Set(true),
            is_deleted: Set(false),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(rack_group_id = %created.id, code = %created.code, "Created rack group");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_rack_group(
        &self,
        rack_group_id: Uuid,
        input: UpdateRackGroup,
    ) -> Result<rack_group::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_rack_group(rack_group_id).await?;

        if let Some(code) = &input.code {
            let clash = RackGroupEntity::find()
                .filter(rack_group::Column::WarehouseId.eq(existing.warehouse_id))
                .filter(rack_group::Column::Code.eq(code.clone()))
                .filter(rack_group::Column::IsDeleted.eq(false))
                .filter(rack_group::Column::Id.ne(rack_group_id))
                .one(db)
                .await?;
            if clash.is_some() {
                return Err(ServiceError::Conflict(
                    "Rack group code already exists in this warehouse".to_string(),
                ));
            }
        }

        let mut active: rack_group::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        Ok(active.update(db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_rack_group(&self, rack_group_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_rack_group(rack_group_id).await?;

        let scope = Condition::all().add(stock_item::Column::RackGroupId.eq(rack_group_id));
        if scope_holds_stock(db, scope).await? {
            return Err(ServiceError::Conflict(
                "Rack group still holds stock".to_string(),
            ));
        }

        let mut active: rack_group::ActiveModel = existing.into();
        active.is_deleted = Set(true);
        active.update(db).await?;
        Ok(())
    }

    // ---- rack levels ----

    #[instrument(skip(self))]
    pub async fn list_rack_levels(
        &self,
        rack_group_id: Option<Uuid>,
    ) -> Result<Vec<rack_level::Model>, ServiceError> {
        let mut query = RackLevelEntity::find().filter(rack_level::Column::IsDeleted.eq(false));
        if let Some(rack_group_id) = rack_group_id {
            query = query.filter(rack_level::Column::RackGroupId.eq(rack_group_id));
        }
        Ok(query
            .order_by_asc(rack_level::Column::LevelNumber)
            .all(self.db_pool.as_ref())
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create_rack_level(
        &self,
        input: CreateRackLevel,
    ) -> Result<rack_level::Model, ServiceError> {
        self.get_rack_group(input.rack_group_id).await?;

        let name = input
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{}. level", input.level_number));

        let created = rack_level::ActiveModel {
            rack_group_id: Set(input.rack_group_id),
            level_number: Set(input.level_number),
            name: Set(Some(name)),
            is_active: Set(true),
            is_deleted: Set(false),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await?;

        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_rack_level(
        &self,
        rack_level_id: Uuid,
        input: UpdateRackLevel,
    ) -> Result<rack_level::Model, ServiceError> {
        let existing = RackLevelEntity::find_by_id(rack_level_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Rack level not found".to_string()))?;

        let mut active: rack_level::ActiveModel = existing.into();
        if let Some(level_number) = input.level_number {
            active.level_number = Set(level_number);
        }
        if let Some(name) = input.name {
            active.name = Set(Some(name));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        Ok(active.update(self.db_pool.as_ref()).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_rack_level(&self, rack_level_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = RackLevelEntity::find_by_id(rack_level_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Rack level not found".to_string()))?;

        let scope = Condition::all().add(stock_item::Column::RackLevelId.eq(rack_level_id));
        if scope_holds_stock(db, scope).await? {
            return Err(ServiceError::Conflict(
                "Rack level still holds stock".to_string(),
            ));
        }

        let mut active: rack_level::ActiveModel = existing.into();
        active.is_deleted = Set(true);
        active.update(db).await?;
        Ok(())
    }

    // ---- rack slots ----

    #[instrument(skip(self))]
    pub async fn list_rack_slots(
        &self,
        rack_level_id: Option<Uuid>,
    ) -> Result<Vec<rack_slot::Model>, ServiceError> {
        let mut query = RackSlotEntity::find().filter(rack_slot::Column::IsDeleted.eq(false));
        if let Some(rack_level_id) = rack_level_id {
            query = query.filter(rack_slot::Column::RackLevelId.eq(rack_level_id));
        }
        Ok(query
            .order_by_asc(rack_slot::Column::SlotNumber)
            .all(self.db_pool.as_ref())
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create_rack_slot(
        &self,
        input: CreateRackSlot,
    ) -> Result<rack_slot::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        RackLevelEntity::find_by_id(input.rack_level_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Rack level not found".to_string()))?;

        let name = input
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Slot {}", input.slot_number));

        let created = rack_slot::ActiveModel {
            rack_level_id: Set(input.rack_level_id),
            slot_number: Set(input.slot_number),
            name: Set(Some(name)),
            is_active: Set(true),
            is_deleted: Set(false),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_rack_slot(
        &self,
        rack_slot_id: Uuid,
        input: UpdateRackSlot,
    ) -> Result<rack_slot::Model, ServiceError> {
        let existing = RackSlotEntity::find_by_id(rack_slot_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Rack slot not found".to_string()))?;

        let mut active: rack_slot::ActiveModel = existing.into();
        if let Some(slot_number) = input.slot_number {
            active.slot_number = Set(slot_number);
        }
        if let Some(name) = input.name {
            active.name = Set(Some(name));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        Ok(active.update(self.db_pool.as_ref()).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_rack_slot(&self, rack_slot_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = RackSlotEntity::find_by_id(rack_slot_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Rack slot not found".to_string()))?;

        let scope = Condition::all().add(stock_item::Column::RackSlotId.eq(rack_slot_id));
        if scope_holds_stock(db, scope).await? {
            return Err(ServiceError::Conflict(
                "Rack slot still holds stock".to_string(),
            ));
        }

        let mut active: rack_slot::ActiveModel = existing.into();
        active.is_deleted = Set(true);
        active.update(db).await?;
        Ok(())
    }
}
