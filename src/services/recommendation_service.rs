//! Recommendation engine with a per-user cache.
//!
//! Lists are cached under `recommendations:user:{id}:...` or
//! `recommendations:anonymous:...`. A cache failure never fails a request:
//! it is logged and the list is computed from the catalog.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::container::parallel;
use crate::config::{
    CACHE_FILTER_ANY, CACHE_PREFIX_RECOMMENDATIONS, CACHE_SEGMENT_ANONYMOUS, CACHE_SEGMENT_USER,
};
use crate::domain::recommendation::{rank, score_activity};
use crate::domain::{Recommendation, RecommendationList, RecommendationQuery, UserProfile};
use crate::errors::AppResult;
use crate::infra::cache::{get_json, set_json};
use crate::infra::{ActivityFilter, CacheStore, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Ranked recommendations for a user, or popularity-only for anonymous callers
    async fn recommend(
        &self,
        user_id: Option<Uuid>,
        query: RecommendationQuery,
    ) -> AppResult<RecommendationList>;

    /// Drop every cached list of one user. Failures are logged, not returned.
    async fn invalidate_user(&self, user_id: Uuid);
}

/// Cache key for one (caller, filters) combination.
pub fn cache_key(user_id: Option<Uuid>, limit: u64, query: &RecommendationQuery) -> String {
    let owner = match user_id {
        Some(id) => format!("{}:{}", CACHE_SEGMENT_USER, id),
        None => CACHE_SEGMENT_ANONYMOUS.to_string(),
    };
    format!(
        "{}{}:{}:{}:{}:{}",
        CACHE_PREFIX_RECOMMENDATIONS,
        owner,
        limit,
        query.tipo.map_or(CACHE_FILTER_ANY, |c| c.as_str()),
        query.localidad.map_or(CACHE_FILTER_ANY, |l| l.as_str()),
        query.exclude_favorited,
    )
}

/// Pattern matching every cached list of one user.
pub fn user_cache_pattern(user_id: Uuid) -> String {
    format!(
        "{}{}:{}:*",
        CACHE_PREFIX_RECOMMENDATIONS, CACHE_SEGMENT_USER, user_id
    )
}

pub struct RecommendationEngine<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheStore>,
    ttl_seconds: u64,
}

impl<U: UnitOfWork> RecommendationEngine<U> {
    pub fn new(uow: Arc<U>, cache: Arc<dyn CacheStore>, ttl_seconds: u64) -> Self {
        Self {
            uow,
            cache,
            ttl_seconds,
        }
    }

    async fn caller_context(
        &self,
        user_id: Option<Uuid>,
    ) -> AppResult<(Option<UserProfile>, HashSet<Uuid>)> {
        let Some(user_id) = user_id else {
            return Ok((None, HashSet::new()));
        };

        let profiles = self.uow.profiles();
        let favorites = self.uow.favorites();
        parallel::join2(
            profiles.find_by_user(user_id),
            favorites.activity_ids_for_user(user_id),
        )
        .await
    }

    async fn compute(
        &self,
        user_id: Option<Uuid>,
        limit: u64,
        query: &RecommendationQuery,
    ) -> AppResult<RecommendationList> {
        let (profile, favorites) = self.caller_context(user_id).await?;

        let filter = ActivityFilter {
            category: query.tipo,
            locality: query.localidad,
            exclude_ids: if query.exclude_favorited {
                favorites.iter().copied().collect()
            } else {
                Vec::new()
            },
        };
        let candidates = self.uow.activities().list_active(filter).await?;

        let scored: Vec<Recommendation> = candidates
            .into_iter()
            .filter(|activity| !(query.exclude_favorited && favorites.contains(&activity.id)))
            .map(|activity| {
                let (score, explanation) = score_activity(&activity, profile.as_ref());
                let is_favorite = favorites.contains(&activity.id);
                Recommendation {
                    actividad: activity,
                    score,
                    explanation,
                    is_favorite,
                }
            })
            .collect();

        let items = rank(scored, limit as usize);
        Ok(RecommendationList {
            total: items.len(),
            items,
            user_profile_complete: profile.as_ref().is_some_and(UserProfile::is_complete),
        })
    }
}

#[async_trait]
impl<U: UnitOfWork> RecommendationService for RecommendationEngine<U> {
    async fn recommend(
        &self,
        user_id: Option<Uuid>,
        query: RecommendationQuery,
    ) -> AppResult<RecommendationList> {
        let limit = query.effective_limit()?;
        let key = cache_key(user_id, limit, &query);

        match get_json::<RecommendationList>(self.cache.as_ref(), &key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Recommendation cache hit");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %key, error = %e, "Recommendation cache read failed"),
        }

        let list = self.compute(user_id, limit, &query).await?;

        if let Err(e) = set_json(self.cache.as_ref(), &key, &list, self.ttl_seconds).await {
            tracing::warn!(key = %key, error = %e, "Recommendation cache write failed");
        }
        Ok(list)
    }

    async fn invalidate_user(&self, user_id: Uuid) {
        match self.cache.delete_pattern(&user_cache_pattern(user_id)).await {
            Ok(removed) => {
                tracing::debug!(user_id = %user_id, removed, "Recommendation cache invalidated")
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Recommendation cache invalidation failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Locality};

    #[test]
    fn keys_separate_users_from_anonymous_callers() {
        let user = Uuid::nil();
        let query = RecommendationQuery {
            tipo: Some(Category::Deporte),
            localidad: Some(Locality::SantaFe),
            exclude_favorited: true,
            ..Default::default()
        };

        assert_eq!(
            cache_key(Some(user), 10, &query),
            format!("recommendations:user:{}:10:deporte:Santa Fe:true", user)
        );
        assert_eq!(
            cache_key(None, 5, &RecommendationQuery::default()),
            "recommendations:anonymous:5:all:all:false"
        );
    }

    #[test]
    fn user_pattern_covers_only_that_user() {
        let user = Uuid::nil();
        let pattern = user_cache_pattern(user);
        let own = cache_key(Some(user), 10, &RecommendationQuery::default());

        assert!(own.starts_with(pattern.trim_end_matches('*')));
        assert!(!cache_key(None, 10, &RecommendationQuery::default())
            .starts_with(pattern.trim_end_matches('*')));
    }
}
