use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    entities::{cookie, packaging_type},
    errors::ServiceError,
    forms::{ChoiceSet, CreateCookie},
};

/// Creates `cmd.name` once per packaging type, ordered by packaging id, with
/// zero stock.
///
/// Runs every insert on `conn`; pass a transaction to get all-or-nothing
/// creation.
#[instrument(skip(conn, active_recipes), fields(name = %cmd.name, recipe_id = cmd.recipe_id))]
pub async fn create_cookie<C: ConnectionTrait>(
    conn: &C,
    active_recipes: &ChoiceSet,
    cmd: CreateCookie,
) -> Result<Vec<cookie::Model>, ServiceError> {
    cmd.validate()?;

    if !active_recipes.contains(cmd.recipe_id) {
        return Err(ServiceError::NotEligible(format!(
            "Recipe {} is not active",
            cmd.recipe_id
        )));
    }

    let existing = cookie::Entity::find()
        .filter(cookie::Column::Name.eq(cmd.name.as_str()))
        .count(conn)
        .await?;
    if existing > 0 {
        return Err(ServiceError::DuplicateCookie { name: cmd.name });
    }

    let packaging = packaging_type::Entity::find()
        .order_by_asc(packaging_type::Column::Id)
        .all(conn)
        .await?;
    if packaging.is_empty() {
        return Err(ServiceError::InternalError(
            "No packaging types are configured".to_string(),
        ));
    }

    let mut created = Vec::with_capacity(packaging.len());
    for kind in &packaging {
        let row = cookie::ActiveModel {
            name: Set(cmd.name.clone()),
            packaging_type_id: Set(kind.id),
            recipe_id: Set(cmd.recipe_id),
            stock: Set(0),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        created.push(row);
    }

    counter!("galletas.cookie.created", 1);
    info!(rows = created.len(), "Created cookie in every packaging type");
    Ok(created)
}
