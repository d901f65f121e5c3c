//! Service container: one place that wires the services to their
//! repositories, cache and job queue.

use std::future::Future;
use std::sync::Arc;

use super::{
    ActivityManager, ActivityService, AuthService, EtlManager, EtlService, FavoriteManager,
    FavoriteService, JwtVerifier, PopularityManager, PopularityService, ProfileManager,
    ProfileService, RecommendationEngine, RecommendationService,
};
use crate::config::Config;
use crate::infra::{CacheStore, UnitOfWork};
use crate::jobs::EtlDispatcher;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn activities(&self) -> Arc<dyn ActivityService>;

    fn favorites(&self) -> Arc<dyn FavoriteService>;

    fn profiles(&self) -> Arc<dyn ProfileService>;

    fn popularity(&self) -> Arc<dyn PopularityService>;

    fn recommendations(&self) -> Arc<dyn RecommendationService>;

    fn etl(&self) -> Arc<dyn EtlService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth: Arc<dyn AuthService>,
    activities: Arc<dyn ActivityService>,
    favorites: Arc<dyn FavoriteService>,
    profiles: Arc<dyn ProfileService>,
    popularity: Arc<dyn PopularityService>,
    recommendations: Arc<dyn RecommendationService>,
    etl: Arc<dyn EtlService>,
}

impl Services {
    pub fn build<U: UnitOfWork + 'static>(
        uow: Arc<U>,
        cache: Arc<dyn CacheStore>,
        dispatcher: Arc<dyn EtlDispatcher>,
        config: &Config,
    ) -> Self {
        let recommendations: Arc<dyn RecommendationService> = Arc::new(RecommendationEngine::new(
            uow.clone(),
            cache,
            config.recommendation_cache_ttl,
        ));

        Self {
            auth: Arc::new(JwtVerifier::new(config.jwt_secret_bytes())),
            activities: Arc::new(ActivityManager::new(uow.clone())),
            favorites: Arc::new(FavoriteManager::new(uow.clone(), recommendations.clone())),
            profiles: Arc::new(ProfileManager::new(uow.clone(), recommendations.clone())),
            popularity: Arc::new(PopularityManager::new(uow.clone())),
            etl: Arc::new(EtlManager::new(uow, dispatcher)),
            recommendations,
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    fn activities(&self) -> Arc<dyn ActivityService> {
        self.activities.clone()
    }

    fn favorites(&self) -> Arc<dyn FavoriteService> {
        self.favorites.clone()
    }

    fn profiles(&self) -> Arc<dyn ProfileService> {
        self.profiles.clone()
    }

    fn popularity(&self) -> Arc<dyn PopularityService> {
        self.popularity.clone()
    }

    fn recommendations(&self) -> Arc<dyn RecommendationService> {
        self.recommendations.clone()
    }

    fn etl(&self) -> Arc<dyn EtlService> {
        self.etl.clone()
    }
}

/// Concurrent execution of independent lookups.
pub mod parallel {
    use super::*;
    use crate::errors::AppResult;
    use tokio::try_join;

    /// Run two fallible operations concurrently; the first error wins.
    pub async fn join2<F1, F2, T1, T2>(f1: F1, f2: F2) -> AppResult<(T1, T2)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
    {
        try_join!(f1, f2)
    }

    /// Run many fallible operations with at most `limit` in flight.
    /// Results come back in completion order.
    pub async fn join_all_limited<F, T, I>(futures: I, limit: usize) -> AppResult<Vec<T>>
    where
        F: Future<Output = AppResult<T>>,
        I: IntoIterator<Item = F>,
    {
        use futures::stream::{self, StreamExt, TryStreamExt};

        stream::iter(futures)
            .buffer_unordered(limit)
            .try_collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, AppResult};

    #[tokio::test]
    async fn join2_returns_both_results() {
        let (a, b) = parallel::join2(async { Ok::<_, AppError>(1) }, async { Ok("two") })
            .await
            .unwrap();
        assert_eq!((a, b), (1, "two"));
    }

    #[tokio::test]
    async fn join2_propagates_the_error() {
        let result: AppResult<(i32, i32)> =
            parallel::join2(async { Err(AppError::NotFound) }, async { Ok(2) }).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn join_all_limited_collects_every_result() {
        let doubled = (1..=5).map(|i| async move { Ok(i * 2) });
        let mut values = tokio_test::assert_ok!(parallel::join_all_limited(doubled, 2).await);
        values.sort();
        assert_eq!(values, vec![2, 4, 6, 8, 10]);
    }

    #[tokio::test]
    async fn join_all_limited_stops_at_the_first_error() {
        let result = parallel::join_all_limited(
            (0..3).map(|i| async move {
                if i == 1 {
                    Err(AppError::NotFound)
                } else {
                    Ok(i)
                }
            }),
            1,
        )
        .await;
        tokio_test::assert_err!(result);
    }
}
