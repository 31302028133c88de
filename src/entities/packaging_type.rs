use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the packaging row whose batches carry the authoritative stock.
pub const UNIT: &str = "Unidad";
pub const KILO_BOX: &str = "Caja de Kilo";
pub const BOX_700G: &str = "Caja de 700 gramos";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "packaging_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub cost: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cookie::Entity")]
    Cookies,
}

impl Related<super::cookie::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cookies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_unit(&self) -> bool {
        self.name == UNIT
    }
}
