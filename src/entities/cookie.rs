use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One sellable cookie in one packaging type. A logical cookie owns one row
/// per packaging type, all created together.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cookies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub packaging_type_id: i32,
    pub recipe_id: i32,
    /// Legacy on-row stock. Batches are authoritative; catalog views never read this.
    pub stock: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::packaging_type::Entity",
        from = "Column::PackagingTypeId",
        to = "super::packaging_type::Column::Id"
    )]
    PackagingType,
    #[sea_orm(
        belongs_to = "super::recipe::Entity",
        from = "Column::RecipeId",
        to = "super::recipe::Column::Id"
    )]
    Recipe,
    #[sea_orm(has_many = "super::cookie_batch::Entity")]
    Batches,
}

impl Related<super::packaging_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PackagingType.def()
    }
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl Related<super::cookie_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
