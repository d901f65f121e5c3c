//! User profile database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{ActivityLevel, Locality, UserProfile};
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "perfiles_usuario")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub usuario_id: Uuid,
    pub etiquetas_interes: Vec<String>,
    pub localidad_preferida: Option<String>,
    pub nivel_actividad: Option<String>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for UserProfile {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            user_id: model.usuario_id,
            interest_tags: model.etiquetas_interes,
            preferred_locality: model
                .localidad_preferida
                .as_deref()
                .map(str::parse::<Locality>)
                .transpose()?,
            preferred_level: model
                .nivel_actividad
                .as_deref()
                .map(str::parse::<ActivityLevel>)
                .transpose()?,
            updated_at: model.updated_at,
        })
    }
}
