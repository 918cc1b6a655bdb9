//! Create admin account table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminAccount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdminAccount::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AdminAccount::Username)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AdminAccount::Password).string_len(256).not_null())
                    .col(
                        ColumnDef::new(AdminAccount::Token)
                            .string_len(64)
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AdminAccount::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminAccount::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AdminAccount {
    Table,
    Id,
    Username,
    Password,
    Token,
    CreatedAt,
}
