use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shelf level inside a rack group. The display name defaults to
/// `"{n}. level"` when none is supplied at creation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rack_levels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rack_group_id: Uuid,
    pub level_number: i32,
    pub name: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rack_group::Entity",
        from = "Column::RackGroupId",
        to = "super::rack_group::Column::Id"
    )]
    RackGroup,
    #[sea_orm(has_many = "super::rack_slot::Entity")]
    RackSlot,
}

impl Related<super::rack_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RackGroup.def()
    }
}

impl Related<super::rack_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RackSlot.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}
