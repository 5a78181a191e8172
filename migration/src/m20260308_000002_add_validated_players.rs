use sea_orm_migration::prelude::*;

/// Player ids confirmed by the affiliate platform's registration postback
#[derive(DeriveIden)]
enum ValidatedPlayers {
    Table,
    PlayerId,
    Currency,
    RegistrationDate,
    Type,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ValidatedPlayers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ValidatedPlayers::PlayerId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ValidatedPlayers::Currency).string_len(16).null())
                    .col(ColumnDef::new(ValidatedPlayers::RegistrationDate).string().null())
                    .col(ColumnDef::new(ValidatedPlayers::Type).string_len(64).null())
                    .col(
                        ColumnDef::new(ValidatedPlayers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ValidatedPlayers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(ValidatedPlayers::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
