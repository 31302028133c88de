use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A dated production lot of one cookie. `quantity` only ever decreases here
/// and never drops below zero.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cookie_batches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub cookie_id: i32,
    pub produced_on: NaiveDate,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cookie::Entity",
        from = "Column::CookieId",
        to = "super::cookie::Column::Id"
    )]
    Cookie,
    #[sea_orm(has_many = "super::cookie_shrinkage::Entity")]
    Shrinkages,
}

impl Related<super::cookie::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cookie.def()
    }
}

impl Related<super::cookie_shrinkage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shrinkages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
