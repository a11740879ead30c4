//! Create fighter request table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FighterRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FighterRequest::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FighterRequest::RequestType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FighterRequest::PlayerName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FighterRequest::PlayerGender).string_len(16))
                    .col(ColumnDef::new(FighterRequest::TargetFighterId).integer())
                    .col(ColumnDef::new(FighterRequest::DeleteReason).string_len(16))
                    .col(
                        ColumnDef::new(FighterRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(FighterRequest::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(FighterRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(FighterRequest::ProcessedBy).uuid())
                    .col(ColumnDef::new(FighterRequest::ProcessedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fighter_request_target")
                            .from(FighterRequest::Table, FighterRequest::TargetFighterId)
                            .to(Fighter::Table, Fighter::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: status (admin queue)
        manager
            .create_index(
                Index::create()
                    .name("idx_fighter_request_status")
                    .table(FighterRequest::Table)
                    .col(FighterRequest::Status)
                    .to_owned(),
            )
            .await?;

        // Index: (created_by, created_at) - daily submission quota
        manager
            .create_index(
                Index::create()
                    .name("idx_fighter_request_created_by_at")
                    .table(FighterRequest::Table)
                    .col(FighterRequest::CreatedBy)
                    .col(FighterRequest::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE fighter_request
                    ADD CONSTRAINT chk_fighter_request_type CHECK (request_type IN ('add', 'delete')),
                    ADD CONSTRAINT chk_fighter_request_status
                        CHECK (status IN ('pending', 'approved', 'rejected')),
                    ADD CONSTRAINT chk_fighter_request_reason
                        CHECK (delete_reason IS NULL OR delete_reason IN ('retirement', 'switch_sport'));
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FighterRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FighterRequest {
    Table,
    Id,
    RequestType,
    PlayerName,
    PlayerGender,
    TargetFighterId,
    DeleteReason,
    Status,
    CreatedBy,
    CreatedAt,
    ProcessedBy,
    ProcessedAt,
}

#[derive(Iden)]
enum Fighter {
    Table,
    Id,
}
