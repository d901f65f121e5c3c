//! Favorites: save and unsave activities, list the caller's saved ones.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::RecommendationService;
use crate::domain::{Activity, Favorite};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A saved activity as listed to its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FavoriteEntry {
    pub id: Uuid,
    pub fecha_guardado: DateTime<Utc>,
    pub actividad: Activity,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait FavoriteService: Send + Sync {
    async fn add(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Favorite>;

    async fn remove(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<()>;

    async fn list(&self, user_id: Uuid, page: PaginationParams) -> AppResult<Paginated<FavoriteEntry>>;
}

pub struct FavoriteManager<U: UnitOfWork> {
    uow: Arc<U>,
    recommendations: Arc<dyn RecommendationService>,
}

impl<U: UnitOfWork> FavoriteManager<U> {
    pub fn new(uow: Arc<U>, recommendations: Arc<dyn RecommendationService>) -> Self {
        Self {
            uow,
            recommendations,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> FavoriteService for FavoriteManager<U> {
    async fn add(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Favorite> {
        let activity = self
            .uow
            .activities()
            .find_by_id(activity_id)
            .await?
            .ok_or_not_found()?;
        if !activity.is_active() {
            return Err(AppError::invalid_state("Only active activities can be saved as favorites"));
        }

        let favorite = self.uow.favorites().add(user_id, activity_id).await?;
        tracing::info!(user_id = %user_id, activity_id = %activity_id, "Favorite added");

        self.recommendations.invalidate_user(user_id).await;
        Ok(favorite)
    }

    async fn remove(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<()> {
        if !self.uow.favorites().remove(user_id, activity_id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(user_id = %user_id, activity_id = %activity_id, "Favorite removed");

        self.recommendations.invalidate_user(user_id).await;
        Ok(())
    }

    async fn list(&self, user_id: Uuid, page: PaginationParams) -> AppResult<Paginated<FavoriteEntry>> {
        let (rows, total) = self.uow.favorites().list_for_user(user_id, page.clone()).await?;
        let entries = rows
            .into_iter()
            .map(|(favorite, actividad)| FavoriteEntry {
                id: favorite.id,
                fecha_guardado: favorite.saved_at,
                actividad,
            })
            .collect();
        Ok(Paginated::new(entries, &page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        ActivityRepository, EtlExecutionRepository, FavoriteRepository, MockActivityRepository,
        MockFavoriteRepository, ProfileRepository,
    };
    use crate::services::MockRecommendationService;

    struct MockUow {
        activities: Arc<MockActivityRepository>,
        favorites: Arc<MockFavoriteRepository>,
    }

    impl UnitOfWork for MockUow {
        fn activities(&self) -> Arc<dyn ActivityRepository> {
            self.activities.clone()
        }
        fn favorites(&self) -> Arc<dyn FavoriteRepository> {
            self.favorites.clone()
        }
        fn executions(&self) -> Arc<dyn EtlExecutionRepository> {
            unreachable!("executions not used")
        }
        fn profiles(&self) -> Arc<dyn ProfileRepository> {
            unreachable!("profiles not used")
        }
    }

    #[tokio::test]
    async fn removing_a_missing_favorite_is_not_found_and_keeps_the_cache() {
        let mut favorites = MockFavoriteRepository::new();
        favorites.expect_remove().returning(|_, _| Ok(false));
        let mut recommendations = MockRecommendationService::new();
        recommendations.expect_invalidate_user().never();

        let service = FavoriteManager::new(
            Arc::new(MockUow {
                activities: Arc::new(MockActivityRepository::new()),
                favorites: Arc::new(favorites),
            }),
            Arc::new(recommendations),
        );

        let result = service.remove(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn unknown_activity_cannot_be_favorited() {
        let mut activities = MockActivityRepository::new();
        activities.expect_find_by_id().returning(|_| Ok(None));
        let mut favorites = MockFavoriteRepository::new();
        favorites.expect_add().never();

        let service = FavoriteManager::new(
            Arc::new(MockUow {
                activities: Arc::new(activities),
                favorites: Arc::new(favorites),
            }),
            Arc::new(MockRecommendationService::new()),
        );

        let result = service.add(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn removal_invalidates_the_owner_cache() {
        let user = Uuid::new_v4();
        let mut favorites = MockFavoriteRepository::new();
        favorites.expect_remove().returning(|_, _| Ok(true));
        let mut recommendations = MockRecommendationService::new();
        recommendations
            .expect_invalidate_user()
            .withf(move |id| *id == user)
            .times(1)
            .returning(|_| ());

        let service = FavoriteManager::new(
            Arc::new(MockUow {
                activities: Arc::new(MockActivityRepository::new()),
                favorites: Arc::new(favorites),
            }),
            Arc::new(recommendations),
        );

        service.remove(user, Uuid::new_v4()).await.unwrap();
    }
}
