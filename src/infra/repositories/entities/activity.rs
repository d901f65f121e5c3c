//! Activity database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Activity, ActivityLevel};
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "actividades")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub titulo: String,
    #[sea_orm(column_type = "Text")]
    pub descripcion: String,
    pub tipo: String,
    pub fecha_inicio: DateTimeUtc,
    pub fecha_fin: Option<DateTimeUtc>,
    pub ubicacion_direccion: String,
    pub ubicacion_lat: f64,
    pub ubicacion_lng: f64,
    pub localidad: String,
    pub precio: f64,
    pub es_gratis: bool,
    pub nivel_actividad: Option<String>,
    pub etiquetas: Vec<String>,
    pub contacto: Option<String>,
    pub enlace_externo: Option<String>,
    pub imagen_url: Option<String>,
    pub fuente: String,
    pub estado: String,
    pub popularidad_favoritos: i64,
    pub popularidad_vistas: f64,
    pub popularidad_normalizada: f64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorites,
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity. Enumerated columns are
/// re-validated; a value outside the catalog is a corrupt row.
impl TryFrom<Model> for Activity {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = model.id;
        let corrupt = |e: AppError| AppError::internal(format!("Corrupt activity row {}: {}", id, e));

        Ok(Activity {
            id: model.id,
            category: model.tipo.parse().map_err(corrupt)?,
            locality: model.localidad.parse().map_err(corrupt)?,
            status: model.estado.parse().map_err(corrupt)?,
            level: model
                .nivel_actividad
                .as_deref()
                .map(str::parse::<ActivityLevel>)
                .transpose()
                .map_err(corrupt)?,
            title: model.titulo,
            description: model.descripcion,
            start: model.fecha_inicio,
            end: model.fecha_fin,
            address: model.ubicacion_direccion,
            latitude: model.ubicacion_lat,
            longitude: model.ubicacion_lng,
            price: model.precio,
            is_free: model.es_gratis,
            tags: model.etiquetas,
            contact: model.contacto,
            external_link: model.enlace_externo,
            imagen_url: model.imagen_url,
            source: model.fuente,
            favorite_count: model.popularidad_favoritos,
            view_score: model.popularidad_vistas,
            normalized_popularity: model.popularidad_normalizada,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
