//! Migration: Create the user preference profiles table.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::sea_query::ColumnType;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PerfilesUsuario::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PerfilesUsuario::UsuarioId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PerfilesUsuario::EtiquetasInteres)
                            .array(ColumnType::Text)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PerfilesUsuario::LocalidadPreferida).string_len(50).null())
                    .col(ColumnDef::new(PerfilesUsuario::NivelActividad).string_len(10).null())
                    .col(
                        ColumnDef::new(PerfilesUsuario::UpdatedAt)
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
            .drop_table(Table::drop().table(PerfilesUsuario::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PerfilesUsuario {
    Table,
    UsuarioId,
    EtiquetasInteres,
    LocalidadPreferida,
    NivelActividad,
    UpdatedAt,
}
