//! Migration: Create the favorites table.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_actividades_table::Actividades;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Favoritos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Favoritos::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Favoritos::UsuarioId).uuid().not_null())
                    .col(ColumnDef::new(Favoritos::ActividadId).uuid().not_null())
                    .col(
                        ColumnDef::new(Favoritos::FechaGuardado)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favoritos_actividad")
                            .from(Favoritos::Table, Favoritos::ActividadId)
                            .to(Actividades::Table, Actividades::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_favoritos_usuario_actividad")
                    .table(Favoritos::Table)
                    .col(Favoritos::UsuarioId)
                    .col(Favoritos::ActividadId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Favoritos::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Favoritos {
    Table,
    Id,
    UsuarioId,
    ActividadId,
    FechaGuardado,
}
