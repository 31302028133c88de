//! Read side of the cookie catalog.
//!
//! Only cookies packaged as [`UNIT`] carry stock: it is the sum of their
//! batch quantities. Box listings are derived from that figure and priced
//! with fixed constants rather than the packaging table.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::{
    entities::{
        cookie,
        cookie_batch,
        packaging_type::{self, BOX_700G, KILO_BOX, UNIT},
        recipe,
    },
    errors::ServiceError,
    forms::{Choice, ChoiceSet},
};

/// Units of stock that fill one kilo box.
pub const KILO_BOX_UNITS: i64 = 25;
/// Units of stock that fill one 700 g box.
pub const BOX_700G_UNITS: i64 = 20;
pub const KILO_BOX_COST: Decimal = dec!(230.00);
pub const BOX_700G_COST: Decimal = dec!(160.00);

/// One line of a catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CatalogItem {
    /// Id of the unit-packaged cookie row the line is computed from.
    pub cookie_id: i32,
    pub name: String,
    pub packaging: String,
    #[schema(value_type = String, example = "12.00")]
    pub cost: Decimal,
    pub stock: i64,
}

/// The three parallel listings shown on the catalog page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct Catalog {
    pub unit: Vec<CatalogItem>,
    pub kilo_box: Vec<CatalogItem>,
    pub box_700g: Vec<CatalogItem>,
}

impl Catalog {
    /// Unit rows with stock, in listing order. Matches `eligible_for_shrinkage`
    /// without another trip to the database.
    pub fn eligible(&self) -> ChoiceSet {
        self.unit
            .iter()
            .filter(|item| item.stock > 0)
            .map(|item| Choice::new(item.cookie_id, item.name.clone()))
            .collect()
    }
}

/// Whole boxes that `units` of loose stock fill. Leftover units are dropped.
pub fn derive_box_stock(units: i64, per_box: i64) -> i64 {
    if per_box <= 0 {
        return 0;
    }
    units.max(0) / per_box
}

struct UnitStock {
    cookie: cookie::Model,
    cost: Decimal,
    units: i64,
}

/// Every unit-packaged cookie with its summed batch quantity, ordered by name.
async fn unit_stock<C: ConnectionTrait>(conn: &C) -> Result<Vec<UnitStock>, ServiceError> {
    let cookies = cookie::Entity::find()
        .find_also_related(packaging_type::Entity)
        .filter(packaging_type::Column::Name.eq(UNIT))
        .order_by_asc(cookie::Column::Name)
        .order_by_asc(cookie::Column::Id)
        .all(conn)
        .await?;

    let ids: Vec<i32> = cookies.iter().map(|(c, _)| c.id).collect();
    let totals: HashMap<i32, i64> = if ids.is_empty() {
        HashMap::new()
    } else {
        cookie_batch::Entity::find()
            .select_only()
            .column(cookie_batch::Column::CookieId)
            .column_as(
                Expr::col((cookie_batch::Entity, cookie_batch::Column::Quantity)).sum(),
                "total",
            )
            .filter(cookie_batch::Column::CookieId.is_in(ids))
            .group_by(cookie_batch::Column::CookieId)
            .into_tuple::<(i32, Option<i64>)>()
            .all(conn)
            .await?
            .into_iter()
            .map(|(id, total)| (id, total.unwrap_or(0)))
            .collect()
    };

    Ok(cookies
        .into_iter()
        .filter_map(|(cookie, packaging)| {
            let packaging = packaging?;
            let units = totals.get(&cookie.id).copied().unwrap_or(0);
            Some(UnitStock {
                cookie,
                cost: packaging.cost,
                units,
            })
        })
        .collect())
}

fn box_item(row: &UnitStock, packaging: &str, cost: Decimal, per_box: i64) -> CatalogItem {
    CatalogItem {
        cookie_id: row.cookie.id,
        name: row.cookie.name.clone(),
        packaging: packaging.to_string(),
        cost,
        stock: derive_box_stock(row.units, per_box),
    }
}

#[instrument(skip(conn))]
pub async fn load_catalog<C: ConnectionTrait>(conn: &C) -> Result<Catalog, ServiceError> {
    let rows = unit_stock(conn).await?;
    let mut catalog = Catalog::default();

    for row in &rows {
        catalog.unit.push(CatalogItem {
            cookie_id: row.cookie.id,
            name: row.cookie.name.clone(),
            packaging: UNIT.to_string(),
            cost: row.cost,
            stock: row.units,
        });
        catalog
            .kilo_box
            .push(box_item(row, KILO_BOX, KILO_BOX_COST, KILO_BOX_UNITS));
        catalog
            .box_700g
            .push(box_item(row, BOX_700G, BOX_700G_COST, BOX_700G_UNITS));
    }

    debug!(cookies = rows.len(), "Loaded cookie catalog");
    Ok(catalog)
}

/// Unit cookies that still have stock in at least one batch, ordered by name.
#[instrument(skip(conn))]
pub async fn eligible_for_shrinkage<C: ConnectionTrait>(conn: &C) -> Result<ChoiceSet, ServiceError> {
    Ok(unit_stock(conn)
        .await?
        .into_iter()
        .filter(|row| row.units > 0)
        .map(|row| Choice::new(row.cookie.id, row.cookie.name))
        .collect())
}

pub async fn active_recipe_choices<C: ConnectionTrait>(conn: &C) -> Result<ChoiceSet, ServiceError> {
    Ok(recipe::Entity::find()
        .filter(recipe::Column::Active.eq(true))
        .order_by_asc(recipe::Column::Name)
        .all(conn)
        .await?
        .into_iter()
        .map(|r| Choice::new(r.id, r.name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn box_stock_drops_the_remainder() {
        assert_eq!(derive_box_stock(49, KILO_BOX_UNITS), 1);
        assert_eq!(derive_box_stock(50, KILO_BOX_UNITS), 2);
        assert_eq!(derive_box_stock(19, BOX_700G_UNITS), 0);
        assert_eq!(derive_box_stock(0, BOX_700G_UNITS), 0);
    }

    #[test]
    fn box_costs_are_fixed() {
        assert_eq!(KILO_BOX_COST.to_string(), "230.00");
        assert_eq!(BOX_700G_COST.to_string(), "160.00");
    }

    proptest! {
        #[test]
        fn box_stock_is_integer_division(units in 0i64..1_000_000) {
            prop_assert_eq!(derive_box_stock(units, KILO_BOX_UNITS), units / 25);
            prop_assert_eq!(derive_box_stock(units, BOX_700G_UNITS), units / 20);
        }

        #[test]
        fn box_stock_never_exceeds_units(units in any::<i64>(), per_box in 1i64..100) {
            let boxes = derive_box_stock(units, per_box);
            prop_assert!(boxes >= 0);
            prop_assert!(boxes * per_box <= units.max(0));
        }
    }
}
