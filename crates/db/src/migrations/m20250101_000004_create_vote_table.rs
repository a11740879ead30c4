//! Create vote ledger table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::UserId).uuid().not_null())
                    .col(ColumnDef::new(Vote::FightCardId).integer().not_null())
                    .col(ColumnDef::new(Vote::VoteType).string_len(16).not_null())
                    .col(ColumnDef::new(Vote::VoteFor).small_integer())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_fight_card")
                            .from(Vote::Table, Vote::FightCardId)
                            .to(FightCard::Table, FightCard::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, fight_card_id, vote_type) - one vote per user per card per type
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_user_card_type")
                    .table(Vote::Table)
                    .col(Vote::UserId)
                    .col(Vote::FightCardId)
                    .col(Vote::VoteType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: fight_card_id (recounting a card)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_fight_card_id")
                    .table(Vote::Table)
                    .col(Vote::FightCardId)
                    .to_owned(),
            )
            .await?;

        // A side is present exactly when the vote is a prediction
        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE vote
                    ADD CONSTRAINT chk_vote_type CHECK (vote_type IN ('prediction', 'popularity')),
                    ADD CONSTRAINT chk_vote_side CHECK (
                        (vote_type = 'prediction' AND vote_for IN (1, 2))
                        OR (vote_type = 'popularity' AND vote_for IS NULL)
                    );
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    UserId,
    FightCardId,
    VoteType,
    VoteFor,
    CreatedAt,
}

#[derive(Iden)]
enum FightCard {
    Table,
    Id,
}
