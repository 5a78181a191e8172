use sea_orm_migration::prelude::*;

/// Weekly tip budget is totalled by assignment time, not draw time
#[derive(DeriveIden)]
enum RaffleWins {
    Table,
    WonAt,
    TipValue,
    TipAssignedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(RaffleWins::Table)
                    .add_column(
                        ColumnDef::new(RaffleWins::TipAssignedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 已有的小费没有设置时间，用抽奖时间补齐
        manager
            .exec_stmt(
                Query::update()
                    .table(RaffleWins::Table)
                    .value(RaffleWins::TipAssignedAt, Expr::col(RaffleWins::WonAt))
                    .and_where(Expr::col(RaffleWins::TipValue).is_not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_raffle_wins_tip_assigned_at")
                    .table(RaffleWins::Table)
                    .col(RaffleWins::TipAssignedAt)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_raffle_wins_tip_assigned_at")
                    .table(RaffleWins::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(RaffleWins::Table)
                    .drop_column(RaffleWins::TipAssignedAt)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
