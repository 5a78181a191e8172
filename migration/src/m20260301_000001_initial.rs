use sea_orm_migration::prelude::*;

/// Participant registrations (form field map stored as JSON)
#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    Data,
    CreatedAt,
}

/// Draw outcomes; `submission_data` is a snapshot taken at draw time
#[derive(DeriveIden)]
enum RaffleWins {
    Table,
    Id,
    SubmissionId,
    SubmissionData,
    WonAt,
    TipValue,
}

/// Single-row page configuration blob
#[derive(DeriveIden)]
enum PageConfigs {
    Table,
    Id,
    Data,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BannedEntries {
    Table,
    Id,
    BanType,
    Value,
    Reason,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Submissions::Data).json().not_null())
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_created_at")
                    .table(Submissions::Table)
                    .col(Submissions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 不建外键: 清空报名时中奖记录需要保留 (30 天滚动窗口)
        manager
            .create_table(
                Table::create()
                    .table(RaffleWins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RaffleWins::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RaffleWins::SubmissionId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RaffleWins::SubmissionData).json().not_null())
                    .col(
                        ColumnDef::new(RaffleWins::WonAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(RaffleWins::TipValue).string_len(64).null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_raffle_wins_won_at")
                    .table(RaffleWins::Table)
                    .col(RaffleWins::WonAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PageConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PageConfigs::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PageConfigs::Data).json().not_null())
                    .col(
                        ColumnDef::new(PageConfigs::UpdatedAt)
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
                    .table(BannedEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BannedEntries::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BannedEntries::BanType).string_len(16).not_null())
                    .col(ColumnDef::new(BannedEntries::Value).string().not_null())
                    .col(
                        ColumnDef::new(BannedEntries::Reason)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(BannedEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_banned_entries_type_value_unique")
                    .table(BannedEntries::Table)
                    .col(BannedEntries::BanType)
                    .col(BannedEntries::Value)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(BannedEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(PageConfigs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(RaffleWins::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Submissions::Table).to_owned())
            .await?;
        Ok(())
    }
}
