//! Create report table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::AnimalType).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Report::Severity)
                            .small_integer()
                            .not_null()
                            .check(
                                Expr::col(Report::Severity)
                                    .gte(1)
                                    .and(Expr::col(Report::Severity).lte(5)),
                            ),
                    )
                    .col(ColumnDef::new(Report::Description).text().null())
                    .col(ColumnDef::new(Report::ImageUrl).string_len(1024).not_null())
                    .col(ColumnDef::new(Report::Latitude).double().not_null())
                    .col(ColumnDef::new(Report::Longitude).double().not_null())
                    .col(ColumnDef::new(Report::Address).text().not_null())
                    .col(ColumnDef::new(Report::ReporterPhone).string_len(32).null())
                    .col(
                        ColumnDef::new(Report::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Report::ClosedBy).string_len(32).null())
                    .col(
                        ColumnDef::new(Report::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Report::FlaggedBy).string_len(32).null())
                    .col(
                        ColumnDef::new(Report::FlaggedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Report::ReportedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Dashboards list by status, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_report_status_reported_at")
                    .table(Report::Table)
                    .col(Report::Status)
                    .col(Report::ReportedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Report {
    Table,
    Id,
    AnimalType,
    Severity,
    Description,
    ImageUrl,
    Latitude,
    Longitude,
    Address,
    ReporterPhone,
    Status,
    ClosedBy,
    ClosedAt,
    FlaggedBy,
    FlaggedAt,
    ReportedAt,
}
