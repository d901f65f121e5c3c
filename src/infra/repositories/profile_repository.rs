//! User preference profile repository.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use super::entities::user_profile::{self, ActiveModel, Entity as UserProfileEntity};
use crate::domain::UserProfile;
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Profile repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// `None` when the user never stored preferences
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;

    /// Insert or replace the user's preferences
    async fn upsert(&self, profile: UserProfile) -> AppResult<UserProfile>;
}

/// Concrete implementation of ProfileRepository
pub struct ProfileStore {
    db: DatabaseConnection,
}

impl ProfileStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileRepository for ProfileStore {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        UserProfileEntity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .map(UserProfile::try_from)
            .transpose()
    }

    async fn upsert(&self, profile: UserProfile) -> AppResult<UserProfile> {
        let active_model = ActiveModel {
            usuario_id: Set(profile.user_id),
            etiquetas_interes: Set(profile.interest_tags.clone()),
            localidad_preferida: Set(profile.preferred_locality.map(|l| l.as_str().to_string())),
            nivel_actividad: Set(profile.preferred_level.map(|l| l.as_str().to_string())),
            updated_at: Set(profile.updated_at),
        };

        UserProfileEntity::insert(active_model)
            .on_conflict(
                OnConflict::column(user_profile::Column::UsuarioId)
                    .update_columns([
                        user_profile::Column::EtiquetasInteres,
                        user_profile::Column::LocalidadPreferida,
                        user_profile::Column::NivelActividad,
                        user_profile::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(profile)
    }
}
