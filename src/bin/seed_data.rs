//! Seed data script - populates the database with a small demo bakery
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 3 recipes (one inactive)
//! - 3 cookies, each in every packaging type
//! - 2-3 dated batches per unit cookie

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use std::time::Duration as StdDuration;
use tracing::info;

use galletas_api::{
    db,
    entities::{cookie, cookie_batch, packaging_type, recipe},
    forms::CreateCookie,
    migrator::Migrator,
    services::{catalog, cookies},
};
use sea_orm_migration::MigratorTrait;

const RECIPES: [(&str, bool); 3] = [
    ("Base mantequilla", true),
    ("Base chocolate", true),
    ("Avena tradicional", false),
];

/// (cookie, recipe, batches as (year, month, day, quantity))
const COOKIES: [(&str, &str, &[(i32, u32, u32, i32)]); 3] = [
    (
        "Chocolate",
        "Base chocolate",
        &[(2024, 1, 1, 10), (2024, 2, 1, 5)],
    ),
    (
        "Mantequilla",
        "Base mantequilla",
        &[(2024, 1, 15, 60), (2024, 2, 10, 40), (2024, 3, 5, 25)],
    ),
    ("Nuez", "Base mantequilla", &[(2024, 2, 20, 0)]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Galletas Seed Data ===");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://galletas.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(StdDuration::from_secs(10))
        .acquire_timeout(StdDuration::from_secs(10));

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;

    info!("Creating recipes...");
    create_recipes(&db).await?;

    info!("Creating cookies and batches...");
    let active = catalog::active_recipe_choices(&db).await?;
    for (name, recipe_name, batches) in COOKIES {
        let existing = cookie::Entity::find()
            .filter(cookie::Column::Name.eq(name))
            .one(&db)
            .await?;
        if existing.is_some() {
            info!("  {} already present, skipping", name);
            continue;
        }

        let recipe = recipe::Entity::find()
            .filter(recipe::Column::Name.eq(recipe_name))
            .one(&db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("recipe {recipe_name} missing"))?;

        let txn = db.begin().await?;
        let outcome = cookies::create_cookie(
            &txn,
            &active,
            CreateCookie {
                name: name.to_string(),
                recipe_id: recipe.id,
            },
        )
        .await;
        let rows = db::finish_transaction(txn, outcome).await?;

        let unit = unit_row(&db, &rows).await?;
        for &(y, m, d, quantity) in batches {
            let produced_on = NaiveDate::from_ymd_opt(y, m, d)
                .ok_or_else(|| anyhow::anyhow!("invalid batch date {y}-{m}-{d}"))?;
            cookie_batch::ActiveModel {
                cookie_id: Set(unit.id),
                produced_on: Set(produced_on),
                quantity: Set(quantity),
                ..Default::default()
            }
            .insert(&db)
            .await?;
        }
        info!("  {} ({} batches)", name, batches.len());
    }

    let listing = catalog::load_catalog(&db).await?;
    for item in &listing.unit {
        info!("  {:<12} {:>4} units", item.name, item.stock);
    }

    info!("Seed data complete");
    Ok(())
}

async fn create_recipes(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (name, active) in RECIPES {
        let exists = recipe::Entity::find()
            .filter(recipe::Column::Name.eq(name))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        recipe::ActiveModel {
            name: Set(name.to_string()),
            active: Set(active),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn unit_row(
    db: &DatabaseConnection,
    rows: &[cookie::Model],
) -> anyhow::Result<cookie::Model> {
    let unit = packaging_type::Entity::find()
        .filter(packaging_type::Column::Name.eq(packaging_type::UNIT))
        .one(db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("packaging type {} missing", packaging_type::UNIT))?;

    rows.iter()
        .find(|row| row.packaging_type_id == unit.id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no unit row created"))
}
