use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of stock movement recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    /// Goods received into a location.
    In,
    /// Goods removed from a location.
    Out,
    /// Goods moved between two locations; one entry carries both addresses.
    Transfer,
    /// Inventory-count correction applied on approval.
    Adjust,
    /// Manual quantity overwrite on a stock item.
    Adjustment,
    /// Reserved-quantity increase for an accepted quotation.
    Reserve,
    /// Reserved-quantity decrease when a quotation leaves "accepted".
    Unreserve,
    /// Stock item removed entirely.
    Delete,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Transfer => "TRANSFER",
            MovementType::Adjust => "ADJUST",
            MovementType::Adjustment => "ADJUSTMENT",
            MovementType::Reserve => "RESERVE",
            MovementType::Unreserve => "UNRESERVE",
            MovementType::Delete => "DELETE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(MovementType::In),
            "OUT" => Some(MovementType::Out),
            "TRANSFER" => Some(MovementType::Transfer),
            "ADJUST" => Some(MovementType::Adjust),
            "ADJUSTMENT" => Some(MovementType::Adjustment),
            "RESERVE" => Some(MovementType::Reserve),
            "UNRESERVE" => Some(MovementType::Unreserve),
            "DELETE" => Some(MovementType::Delete),
            _ => None,
        }
    }

    /// Whether this movement's delta changes the on-hand quantity.
    /// RESERVE/UNRESERVE deltas act on the reserved quantity only, so the
    /// ledger is reconstructed from the remaining types.
    pub fn affects_on_hand(&self) -> bool {
        !matches!(self, MovementType::Reserve | MovementType::Unreserve)
    }
}

/// Append-only audit record of a single quantity change. Never updated or
/// deleted once written.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub movement_type: String,
    pub warehouse_id: Uuid,
    // Nullable because inventory counts may name only the warehouse
    pub rack_group_id: Option<Uuid>,
    pub rack_level_id: Option<Uuid>,
    pub rack_slot_id: Option<Uuid>,
    pub target_warehouse_id: Option<Uuid>,
    pub target_rack_group_id: Option<Uuid>,
    pub target_rack_level_id: Option<Uuid>,
    pub target_rack_slot_id: Option<Uuid>,
    pub product_id: Uuid,
    pub variant_id: String,
    pub variant_name: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    pub source_address: Option<String>,
    pub target_address: Option<String>,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            active_model.created_at = Set(Utc::now());
        }

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_type_round_trips_through_strings() {
        for mt in [
            MovementType::In,
            MovementType::Out,
            MovementType::Transfer,
            MovementType::Adjust,
            MovementType::Adjustment,
            MovementType::Reserve,
            MovementType::Unreserve,
            MovementType::Delete,
        ] {
            assert_eq!(MovementType::from_str(mt.as_str()), Some(mt));
        }
        assert_eq!(MovementType::from_str("RECEIVE"), None);
    }

    #[test]
    fn reservation_movements_do_not_affect_on_hand() {
        assert!(!MovementType::Reserve.affects_on_hand());
        assert!(!MovementType::Unreserve.affects_on_hand());
        assert!(MovementType::In.affects_on_hand());
        assert!(MovementType::Delete.affects_on_hand());
    }
}
