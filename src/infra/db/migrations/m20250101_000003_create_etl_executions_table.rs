//! Migration: Create the ETL executions table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EtlExecutions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EtlExecutions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(EtlExecutions::Status).string_len(20).not_null())
                    .col(ColumnDef::new(EtlExecutions::Source).string_len(100).not_null())
                    .col(ColumnDef::new(EtlExecutions::StartedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(EtlExecutions::FinishedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(EtlExecutions::RecordsExtracted).integer().not_null().default(0))
                    .col(ColumnDef::new(EtlExecutions::RecordsTransformed).integer().not_null().default(0))
                    .col(ColumnDef::new(EtlExecutions::RecordsLoaded).integer().not_null().default(0))
                    .col(ColumnDef::new(EtlExecutions::RecordsFailed).integer().not_null().default(0))
                    .col(ColumnDef::new(EtlExecutions::ErrorMessage).text().null())
                    .col(ColumnDef::new(EtlExecutions::TriggeredBy).string_len(100).not_null())
                    .col(ColumnDef::new(EtlExecutions::Config).json_binary().null())
                    .col(ColumnDef::new(EtlExecutions::Details).json_binary().null())
                    .col(
                        ColumnDef::new(EtlExecutions::CreatedAt)
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
                    .name("idx_etl_executions_created_at")
                    .table(EtlExecutions::Table)
                    .col(EtlExecutions::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EtlExecutions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EtlExecutions {
    Table,
    Id,
    Status,
    Source,
    StartedAt,
    FinishedAt,
    RecordsExtracted,
    RecordsTransformed,
    RecordsLoaded,
    RecordsFailed,
    ErrorMessage,
    TriggeredBy,
    Config,
    Details,
    CreatedAt,
}
