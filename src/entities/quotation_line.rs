use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a quotation as the stock engine sees it. `model_name` is the
/// legacy fallback used to derive a variant key when `variant_id` is unset;
/// optional lines never touch stock.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotation_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<String>,
    pub model_name: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    pub is_optional: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// The variant key this line reserves under: explicit variant id first,
    /// then the model-name fallback, otherwise the empty "no variant" key.
    pub fn variant_key(&self) -> String {
        self.variant_id
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| self.model_name.clone().filter(|m| !m.is_empty()))
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quotation::Entity",
        from = "Column::QuotationId",
        to = "super::quotation::Column::Id"
    )]
    Quotation,
}

impl Related<super::quotation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quotation.def()
    }
}

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
    use rust_decimal_macros::dec;

    fn line(variant_id: Option<&str>, model_name: Option<&str>) -> Model {
        Model {
            id: Uuid::new_v4(),
            quotation_id: Uuid::new_v4(),
            product_id: Some(Uuid::new_v4()),
            variant_id: variant_id.map(str::to_string),
            model_name: model_name.map(str::to_string),
            quantity: dec!(1),
            is_optional: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn variant_key_prefers_variant_id() {
        assert_eq!(line(Some("V1"), Some("M1")).variant_key(), "V1");
    }

    #[test]
    fn variant_key_falls_back_to_model_name() {
        assert_eq!(line(None, Some("M1")).variant_key(), "M1");
        assert_eq!(line(Some(""), Some("M1")).variant_key(), "M1");
    }

    #[test]
    fn variant_key_defaults_to_empty() {
        assert_eq!(line(None, None).variant_key(), "");
    }
}
