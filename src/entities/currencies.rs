//! SeaORM entity for the currency registry.
//!
//! Every rate is quoted against the same reference unit; the reference
//! currency itself carries a rate of exactly 1.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Display symbol, e.g. "$" or "€"
    pub symbol: String,
    /// Units of this currency per one reference unit, always positive
    #[sea_orm(column_type = "Decimal(Some((12, 6)))")]
    pub exchange_rate: Decimal,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
    #[sea_orm(has_many = "super::product_prices::Entity")]
    ProductPrices,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::product_prices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductPrices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
