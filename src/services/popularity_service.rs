//! Popularity recalculation over the active catalog.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::container::parallel;
use crate::config::POPULARITY_WRITE_CONCURRENCY;
use crate::domain::popularity::{normalization_base, raw_score};
use crate::errors::AppResult;
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PopularityReport {
    /// Activities whose normalized popularity was written
    pub updated: usize,
    /// Normalization denominator: the largest raw score, at least 1.0
    pub max_score: f64,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PopularityService: Send + Sync {
    /// Recompute normalized popularity for every active activity
    async fn recalculate(&self) -> AppResult<PopularityReport>;
}

pub struct PopularityManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> PopularityManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> PopularityService for PopularityManager<U> {
    async fn recalculate(&self) -> AppResult<PopularityReport> {
        let activities = self.uow.activities();
        let inputs = activities.popularity_inputs().await?;

        let raw: Vec<f64> = inputs
            .iter()
            .map(|input| raw_score(input.favorite_count, input.view_score))
            .collect();
        let max_score = normalization_base(&raw);

        let scores: Vec<(Uuid, f64)> = inputs
            .iter()
            .zip(&raw)
            .map(|(input, raw)| (input.activity_id, raw / max_score))
            .collect();
        let writes = scores.into_iter().map(|(id, value)| {
            let activities = activities.clone();
            async move { activities.set_normalized_popularity(id, value).await }
        });
        parallel::join_all_limited(writes, POPULARITY_WRITE_CONCURRENCY).await?;

        let report = PopularityReport {
            updated: inputs.len(),
            max_score,
        };
        tracing::info!(updated = report.updated, max_score = report.max_score, "Popularity recalculated");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PopularityInput;
    use crate::infra::{
        ActivityRepository, EtlExecutionRepository, FavoriteRepository, MockActivityRepository,
        ProfileRepository,
    };
    use std::sync::Mutex;

    struct MockUow {
        activities: Arc<MockActivityRepository>,
    }

    impl UnitOfWork for MockUow {
        fn activities(&self) -> Arc<dyn ActivityRepository> {
            self.activities.clone()
        }
        fn favorites(&self) -> Arc<dyn FavoriteRepository> {
            unreachable!("favorites not used")
        }
        fn executions(&self) -> Arc<dyn EtlExecutionRepository> {
            unreachable!("executions not used")
        }
        fn profiles(&self) -> Arc<dyn ProfileRepository> {
            unreachable!("profiles not used")
        }
    }

    #[tokio::test]
    async fn writes_scores_relative_to_the_maximum() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let inputs = vec![
            PopularityInput { activity_id: ids[0], favorite_count: 0, view_score: 0.0 },
            PopularityInput { activity_id: ids[1], favorite_count: 5, view_score: 0.0 },
            PopularityInput { activity_id: ids[2], favorite_count: 10, view_score: 0.0 },
        ];

        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = written.clone();
        let mut repo = MockActivityRepository::new();
        repo.expect_popularity_inputs()
            .returning(move || Ok(inputs.clone()));
        repo.expect_set_normalized_popularity()
            .times(3)
            .returning(move |id, value| {
                sink.lock().unwrap().push((id, value));
                Ok(())
            });

        let service = PopularityManager::new(Arc::new(MockUow {
            activities: Arc::new(repo),
        }));
        let report = tokio_test::assert_ok!(service.recalculate().await);

        assert_eq!(report.updated, 3);
        assert_eq!(report.max_score, 10.0);
        let mut written = written.lock().unwrap();
        written.sort_by(|a, b| a.1.total_cmp(&b.1));
        assert_eq!(
            written.as_slice(),
            &[(ids[0], 0.0), (ids[1], 0.5), (ids[2], 1.0)]
        );
    }

    #[tokio::test]
    async fn empty_catalog_reports_the_floor() {
        let mut repo = MockActivityRepository::new();
        repo.expect_popularity_inputs().returning(|| Ok(Vec::new()));
        repo.expect_set_normalized_popularity().never();

        let service = PopularityManager::new(Arc::new(MockUow {
            activities: Arc::new(repo),
        }));
        let report = service.recalculate().await.unwrap();

        assert_eq!(report.updated, 0);
        assert_eq!(report.max_score, 1.0);
    }
}
