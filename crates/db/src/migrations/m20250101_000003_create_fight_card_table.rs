//! Create fight card table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FightCard::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FightCard::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FightCard::Fighter1Id).integer().not_null())
                    .col(ColumnDef::new(FightCard::Fighter2Id).integer().not_null())
                    .col(
                        ColumnDef::new(FightCard::OrganizationId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FightCard::WeightClassId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FightCard::Fighter1Votes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FightCard::Fighter2Votes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FightCard::PopularityVotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(FightCard::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(FightCard::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fight_card_fighter1")
                            .from(FightCard::Table, FightCard::Fighter1Id)
                            .to(Fighter::Table, Fighter::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fight_card_fighter2")
                            .from(FightCard::Table, FightCard::Fighter2Id)
                            .to(Fighter::Table, Fighter::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fight_card_organization")
                            .from(FightCard::Table, FightCard::OrganizationId)
                            .to(Organization::Table, Organization::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fight_card_weight_class")
                            .from(FightCard::Table, FightCard::WeightClassId)
                            .to(WeightClass::Table, WeightClass::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Counters never go negative; a card never pits a fighter against themselves
        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE fight_card
                    ADD CONSTRAINT chk_fight_card_counters CHECK (
                        fighter1_votes >= 0 AND fighter2_votes >= 0 AND popularity_votes >= 0
                    ),
                    ADD CONSTRAINT chk_fight_card_distinct_fighters CHECK (fighter1_id <> fighter2_id);
                ",
            )
            .await?;

        // Unique matchup regardless of corner order
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_fight_card_matchup
                ON fight_card (
                    LEAST(fighter1_id, fighter2_id),
                    GREATEST(fighter1_id, fighter2_id),
                    organization_id,
                    weight_class_id
                );
                ",
            )
            .await?;

        // Index: popularity_votes (ranking order)
        manager
            .create_index(
                Index::create()
                    .name("idx_fight_card_popularity")
                    .table(FightCard::Table)
                    .col(FightCard::PopularityVotes)
                    .to_owned(),
            )
            .await?;

        // Index: (created_by, created_at) - daily creation quota
        manager
            .create_index(
                Index::create()
                    .name("idx_fight_card_created_by_at")
                    .table(FightCard::Table)
                    .col(FightCard::CreatedBy)
                    .col(FightCard::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FightCard::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FightCard {
    Table,
    Id,
    Fighter1Id,
    Fighter2Id,
    OrganizationId,
    WeightClassId,
    Fighter1Votes,
    Fighter2Votes,
    PopularityVotes,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Fighter {
    Table,
    Id,
}

#[derive(Iden)]
enum Organization {
    Table,
    Id,
}

#[derive(Iden)]
enum WeightClass {
    Table,
    Id,
}
