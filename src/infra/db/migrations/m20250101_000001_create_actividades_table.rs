//! Migration: Create the activities catalog table.

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
                    .table(Actividades::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Actividades::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Actividades::Titulo).string_len(255).not_null())
                    .col(ColumnDef::new(Actividades::Descripcion).text().not_null())
                    .col(ColumnDef::new(Actividades::Tipo).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Actividades::FechaInicio)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Actividades::FechaFin).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Actividades::UbicacionDireccion)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Actividades::UbicacionLat).double().not_null())
                    .col(ColumnDef::new(Actividades::UbicacionLng).double().not_null())
                    .col(ColumnDef::new(Actividades::Localidad).string_len(50).not_null())
                    .col(ColumnDef::new(Actividades::Precio).double().not_null().default(0.0))
                    .col(ColumnDef::new(Actividades::EsGratis).boolean().not_null().default(true))
                    .col(ColumnDef::new(Actividades::NivelActividad).string_len(10).null())
                    .col(
                        ColumnDef::new(Actividades::Etiquetas)
                            .array(ColumnType::Text)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Actividades::Contacto).string_len(255).null())
                    .col(ColumnDef::new(Actividades::EnlaceExterno).text().null())
                    .col(ColumnDef::new(Actividades::ImagenUrl).text().null())
                    .col(ColumnDef::new(Actividades::Fuente).string_len(100).not_null())
                    .col(ColumnDef::new(Actividades::Estado).string_len(30).not_null())
                    .col(
                        ColumnDef::new(Actividades::PopularidadFavoritos)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Actividades::PopularidadVistas)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Actividades::PopularidadNormalizada)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Actividades::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Actividades::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_actividades_estado", Actividades::Estado),
            ("idx_actividades_tipo", Actividades::Tipo),
            ("idx_actividades_localidad", Actividades::Localidad),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Actividades::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        // Cross-batch duplicate guard
        manager
            .create_index(
                Index::create()
                    .name("uq_actividades_catalogo")
                    .table(Actividades::Table)
                    .col(Actividades::Titulo)
                    .col(Actividades::FechaInicio)
                    .col(Actividades::UbicacionDireccion)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Actividades::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Actividades {
    Table,
    Id,
    Titulo,
    Descripcion,
    Tipo,
    FechaInicio,
    FechaFin,
    UbicacionDireccion,
    UbicacionLat,
    UbicacionLng,
    Localidad,
    Precio,
    EsGratis,
    NivelActividad,
    Etiquetas,
    Contacto,
    EnlaceExterno,
    ImagenUrl,
    Fuente,
    Estado,
    PopularidadFavoritos,
    PopularidadVistas,
    PopularidadNormalizada,
    CreatedAt,
    UpdatedAt,
}
