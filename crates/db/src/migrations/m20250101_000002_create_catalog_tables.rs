//! Create organization, weight class and fighter tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organization::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organization::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Organization::Name)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Organization::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WeightClass::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeightClass::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WeightClass::Name).string_len(64).not_null())
                    .col(ColumnDef::new(WeightClass::Gender).string_len(16).not_null())
                    .col(
                        ColumnDef::new(WeightClass::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (name, gender) - one division per name per gender
        manager
            .create_index(
                Index::create()
                    .name("idx_weight_class_name_gender")
                    .table(WeightClass::Table)
                    .col(WeightClass::Name)
                    .col(WeightClass::Gender)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Fighter::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Fighter::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Fighter::Name)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Fighter::Gender).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Fighter::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE weight_class
                    ADD CONSTRAINT chk_weight_class_gender CHECK (gender IN ('male', 'female'));
                ALTER TABLE fighter
                    ADD CONSTRAINT chk_fighter_gender CHECK (gender IN ('male', 'female'));
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Fighter::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WeightClass::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Organization::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Organization {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum WeightClass {
    Table,
    Id,
    Name,
    Gender,
    CreatedAt,
}

#[derive(Iden)]
enum Fighter {
    Table,
    Id,
    Name,
    Gender,
    CreatedAt,
}
