//! Create NGO profiles table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profiles::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profiles::Name).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Profiles::Email)
                            .string_len(256)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Profiles::Password).string_len(256).not_null())
                    .col(ColumnDef::new(Profiles::Token).string_len(64).null().unique_key())
                    .col(ColumnDef::new(Profiles::Description).text().null())
                    .col(
                        ColumnDef::new(Profiles::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending_approval"),
                    )
                    .col(
                        ColumnDef::new(Profiles::Animals)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Profiles::Transport)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Profiles::Latitude)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Profiles::Longitude)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Profiles::Address).text().not_null().default(""))
                    .col(ColumnDef::new(Profiles::ContactPhone).string_len(32).null())
                    .col(ColumnDef::new(Profiles::Website).string_len(512).null())
                    .col(
                        ColumnDef::new(Profiles::TotalRescues)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Profiles::TotalRescues).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Profiles::Rating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Profiles::ProfileComplete)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Profiles::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Profiles::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Admin list filters by status
        manager
            .create_index(
                Index::create()
                    .name("idx_profiles_status")
                    .table(Profiles::Table)
                    .col(Profiles::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    Name,
    Email,
    Password,
    Token,
    Description,
    Status,
    Animals,
    Transport,
    Latitude,
    Longitude,
    Address,
    ContactPhone,
    Website,
    TotalRescues,
    Rating,
    ProfileComplete,
    RegisteredAt,
    ApprovedAt,
}
