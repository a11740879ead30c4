//! Create user Top 4 table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserTop4::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserTop4::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserTop4::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserTop4::WeightClassId).integer().not_null())
                    .col(ColumnDef::new(UserTop4::FighterId).integer().not_null())
                    .col(ColumnDef::new(UserTop4::Position).small_integer().not_null())
                    .col(
                        ColumnDef::new(UserTop4::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_top4_fighter")
                            .from(UserTop4::Table, UserTop4::FighterId)
                            .to(Fighter::Table, Fighter::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_top4_weight_class")
                            .from(UserTop4::Table, UserTop4::WeightClassId)
                            .to(WeightClass::Table, WeightClass::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, weight_class_id, position) - one fighter per slot
        manager
            .create_index(
                Index::create()
                    .name("idx_user_top4_slot")
                    .table(UserTop4::Table)
                    .col(UserTop4::UserId)
                    .col(UserTop4::WeightClassId)
                    .col(UserTop4::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: weight_class_id (community aggregation)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_top4_weight_class_id")
                    .table(UserTop4::Table)
                    .col(UserTop4::WeightClassId)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE user_top4
                    ADD CONSTRAINT chk_user_top4_position CHECK (position BETWEEN 1 AND 4);
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserTop4::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserTop4 {
    Table,
    Id,
    UserId,
    WeightClassId,
    FighterId,
    Position,
    CreatedAt,
}

#[derive(Iden)]
enum Fighter {
    Table,
    Id,
}

#[derive(Iden)]
enum WeightClass {
    Table,
    Id,
}
