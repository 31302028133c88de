use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Only active recipes may back a new cookie.
    pub active: bool,
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
