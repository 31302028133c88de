use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_packaging_types_table::Migration),
            Box::new(m20240101_000002_create_recipes_table::Migration),
            Box::new(m20240101_000003_create_cookies_table::Migration),
            Box::new(m20240101_000004_create_cookie_batches_table::Migration),
            Box::new(m20240101_000005_create_cookie_shrinkages_table::Migration),
        ]
    }
}

#[derive(Iden)]
enum PackagingTypes {
    Table,
    Id,
    Name,
    Cost,
}

#[derive(Iden)]
enum Recipes {
    Table,
    Id,
    Name,
    Active,
}

#[derive(Iden)]
enum Cookies {
    Table,
    Id,
    Name,
    PackagingTypeId,
    RecipeId,
    Stock,
}

#[derive(Iden)]
enum CookieBatches {
    Table,
    Id,
    CookieId,
    ProducedOn,
    Quantity,
}

#[derive(Iden)]
enum CookieShrinkages {
    Table,
    Id,
    BatchId,
    Kind,
    Quantity,
    Description,
    RecordedOn,
    CreatedAt,
}

mod m20240101_000001_create_packaging_types_table {
    use super::PackagingTypes;
    use crate::entities::packaging_type::{BOX_700G, KILO_BOX, UNIT};
    use rust_decimal::Decimal;
    use sea_orm_migration::prelude::*;

    /// Packaging reference data: name and unit cost in cents.
    const PACKAGING_TYPES: [(&str, i64); 3] = [(UNIT, 1200), (KILO_BOX, 23000), (BOX_700G, 16000)];

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_packaging_types_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PackagingTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PackagingTypes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PackagingTypes::Name)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(PackagingTypes::Cost)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            let mut insert = Query::insert();
            insert
                .into_table(PackagingTypes::Table)
                .columns([PackagingTypes::Name, PackagingTypes::Cost]);
            for (name, cents) in PACKAGING_TYPES {
                insert
                    .values([name.into(), Decimal::new(cents, 2).into()])
                    .map_err(|e| DbErr::Custom(e.to_string()))?;
            }
            manager.exec_stmt(insert).await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PackagingTypes::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000002_create_recipes_table {
    use super::Recipes;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_recipes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Recipes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Recipes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Recipes::Name).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Recipes::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Recipes::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000003_create_cookies_table {
    use super::{Cookies, PackagingTypes, Recipes};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_cookies_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Cookies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Cookies::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Cookies::Name).string_len(100).not_null())
                        .col(ColumnDef::new(Cookies::PackagingTypeId).integer().not_null())
                        .col(ColumnDef::new(Cookies::RecipeId).integer().not_null())
                        .col(
                            ColumnDef::new(Cookies::Stock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cookies_packaging_type")
                                .from(Cookies::Table, Cookies::PackagingTypeId)
                                .to(PackagingTypes::Table, PackagingTypes::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cookies_recipe")
                                .from(Cookies::Table, Cookies::RecipeId)
                                .to(Recipes::Table, Recipes::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cookies_name_packaging")
                        .table(Cookies::Table)
                        .col(Cookies::Name)
                        .col(Cookies::PackagingTypeId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Cookies::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000004_create_cookie_batches_table {
    use super::{CookieBatches, Cookies};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_cookie_batches_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CookieBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CookieBatches::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(CookieBatches::CookieId).integer().not_null())
                        .col(ColumnDef::new(CookieBatches::ProducedOn).date().not_null())
                        .col(
                            ColumnDef::new(CookieBatches::Quantity)
                                .integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(CookieBatches::Quantity).gte(0)),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cookie_batches_cookie")
                                .from(CookieBatches::Table, CookieBatches::CookieId)
                                .to(Cookies::Table, Cookies::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // FIFO lookups: batches of one cookie ordered by production date
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cookie_batches_cookie_produced")
                        .table(CookieBatches::Table)
                        .col(CookieBatches::CookieId)
                        .col(CookieBatches::ProducedOn)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CookieBatches::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000005_create_cookie_shrinkages_table {
    use super::{CookieBatches, CookieShrinkages};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_cookie_shrinkages_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CookieShrinkages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CookieShrinkages::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(CookieShrinkages::BatchId).integer().not_null())
                        .col(ColumnDef::new(CookieShrinkages::Kind).string_len(30).not_null())
                        .col(
                            ColumnDef::new(CookieShrinkages::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(CookieShrinkages::Quantity).gt(0)),
                        )
                        .col(
                            ColumnDef::new(CookieShrinkages::Description)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(ColumnDef::new(CookieShrinkages::RecordedOn).date().not_null())
                        .col(
                            ColumnDef::new(CookieShrinkages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cookie_shrinkages_batch")
                                .from(CookieShrinkages::Table, CookieShrinkages::BatchId)
                                .to(CookieBatches::Table, CookieBatches::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cookie_shrinkages_batch")
                        .table(CookieShrinkages::Table)
                        .col(CookieShrinkages::BatchId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CookieShrinkages::Table).to_owned())
                .await
        }
    }
}
