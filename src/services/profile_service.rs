//! Preference profile of the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::RecommendationService;
use crate::domain::{normalize_tags, ActivityLevel, Locality, UserProfile};
use crate::errors::{format_validation_errors, AppError, AppResult};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Replacement preferences. Locality and level must use the catalog spelling.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    #[validate(length(max = 10, message = "must contain at most 10 tags"))]
    pub etiquetas_interes: Vec<String>,
    #[serde(default)]
    pub localidad_preferida: Option<Locality>,
    #[serde(default)]
    pub nivel_actividad: Option<ActivityLevel>,
}

/// Stored preferences plus whether any of them is set
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProfileView {
    pub usuario_id: Uuid,
    pub etiquetas_interes: Vec<String>,
    pub localidad_preferida: Option<Locality>,
    pub nivel_actividad: Option<ActivityLevel>,
    pub updated_at: DateTime<Utc>,
    pub complete: bool,
}

impl From<UserProfile> for ProfileView {
    fn from(profile: UserProfile) -> Self {
        Self {
            complete: profile.is_complete(),
            usuario_id: profile.user_id,
            etiquetas_interes: profile.interest_tags,
            localidad_preferida: profile.preferred_locality,
            nivel_actividad: profile.preferred_level,
            updated_at: profile.updated_at,
        }
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Stored profile, or an empty one for users who never saved preferences
    async fn get(&self, user_id: Uuid) -> AppResult<ProfileView>;

    async fn update(&self, user_id: Uuid, request: UpdateProfileRequest) -> AppResult<ProfileView>;
}

pub struct ProfileManager<U: UnitOfWork> {
    uow: Arc<U>,
    recommendations: Arc<dyn RecommendationService>,
}

impl<U: UnitOfWork> ProfileManager<U> {
    pub fn new(uow: Arc<U>, recommendations: Arc<dyn RecommendationService>) -> Self {
        Self {
            uow,
            recommendations,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> ProfileService for ProfileManager<U> {
    async fn get(&self, user_id: Uuid) -> AppResult<ProfileView> {
        let profile = self
            .uow
            .profiles()
            .find_by_user(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::empty(user_id));
        Ok(profile.into())
    }

    async fn update(&self, user_id: Uuid, request: UpdateProfileRequest) -> AppResult<ProfileView> {
        request
            .validate()
            .map_err(|errors| AppError::validation(format_validation_errors(&errors)))?;

        let profile = UserProfile {
            user_id,
            interest_tags: normalize_tags(request.etiquetas_interes),
            preferred_locality: request.localidad_preferida,
            preferred_level: request.nivel_actividad,
            updated_at: Utc::now(),
        };
        let saved = self.uow.profiles().upsert(profile).await?;
        tracing::info!(user_id = %user_id, tags = saved.interest_tags.len(), "Profile updated");

        self.recommendations.invalidate_user(user_id).await;
        Ok(saved.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        ActivityRepository, EtlExecutionRepository, FavoriteRepository, MockProfileRepository,
        ProfileRepository,
    };
    use crate::services::MockRecommendationService;

    struct MockUow {
        profiles: Arc<MockProfileRepository>,
    }

    impl UnitOfWork for MockUow {
        fn activities(&self) -> Arc<dyn ActivityRepository> {
            unreachable!("activities not used")
        }
        fn favorites(&self) -> Arc<dyn FavoriteRepository> {
            unreachable!("favorites not used")
        }
        fn executions(&self) -> Arc<dyn EtlExecutionRepository> {
            unreachable!("executions not used")
        }
        fn profiles(&self) -> Arc<dyn ProfileRepository> {
            self.profiles.clone()
        }
    }

    #[tokio::test]
    async fn missing_profile_is_empty_and_incomplete() {
        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_by_user().returning(|_| Ok(None));
        let service = ProfileManager::new(
            Arc::new(MockUow {
                profiles: Arc::new(profiles),
            }),
            Arc::new(MockRecommendationService::new()),
        );

        let view = service.get(Uuid::new_v4()).await.unwrap();
        assert!(!view.complete);
        assert!(view.etiquetas_interes.is_empty());
    }

    #[tokio::test]
    async fn update_normalizes_tags_and_invalidates_recommendations() {
        let user = Uuid::new_v4();
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_upsert()
            .withf(|p| p.interest_tags == vec!["arte".to_string(), "musica".to_string()])
            .returning(|p| Ok(p));
        let mut recommendations = MockRecommendationService::new();
        recommendations
            .expect_invalidate_user()
            .withf(move |id| *id == user)
            .times(1)
            .returning(|_| ());

        let service = ProfileManager::new(
            Arc::new(MockUow {
                profiles: Arc::new(profiles),
            }),
            Arc::new(recommendations),
        );

        let view = service
            .update(
                user,
                UpdateProfileRequest {
                    etiquetas_interes: vec![" Arte ".into(), "MUSICA".into(), "arte".into()],
                    localidad_preferida: Some(Locality::Chapinero),
                    nivel_actividad: None,
                },
            )
            .await
            .unwrap();

        assert!(view.complete);
        assert_eq!(view.localidad_preferida, Some(Locality::Chapinero));
    }

    #[tokio::test]
    async fn more_than_ten_tags_is_rejected() {
        let mut profiles = MockProfileRepository::new();
        profiles.expect_upsert().never();
        let service = ProfileManager::new(
            Arc::new(MockUow {
                profiles: Arc::new(profiles),
            }),
            Arc::new(MockRecommendationService::new()),
        );

        let request = UpdateProfileRequest {
            etiquetas_interes: (0..11).map(|i| format!("tag{}", i)).collect(),
            ..Default::default()
        };
        let result = service.update(Uuid::new_v4(), request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
