use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// A priced SKU under a product. Unlike its parents, `active` is a plain field.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "article")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub active: bool,
    /// At most 4 digits, 2 of them after the decimal point
    #[sea_orm(column_type = "Decimal(Some((4, 2)))")]
    pub price: Decimal,
    pub product_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = super::timestamp_now();

        if insert {
            if let ActiveValue::NotSet = active_model.active {
                active_model.active = Set(false);
            }
            active_model.created_at = Set(now);
            active_model.updated_at = Set(now);
        } else if !matches!(active_model.updated_at, ActiveValue::Set(_)) {
            active_model.updated_at = Set(now);
        }

        Ok(active_model)
    }
}
