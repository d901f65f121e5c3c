//! Recommendation scoring.
//!
//! Score = popularity base (normalized popularity x 10) plus profile affinity
//! bonuses: 10 per shared interest tag (capped at 30), 5 for the preferred
//! locality, 3 for the preferred level. The total is capped at 100.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};

use super::activity::Activity;
use super::catalog::{Category, Locality};
use super::profile::UserProfile;
use crate::config::{
    DEFAULT_RECOMMENDATION_LIMIT, LEVEL_MATCH_POINTS, LOCALITY_MATCH_POINTS,
    MAX_RECOMMENDATION_LIMIT, MAX_RECOMMENDATION_SCORE, POPULARITY_BASE_MULTIPLIER,
    POPULAR_REASON_THRESHOLD, TAG_MATCH_CAP, TAG_MATCH_POINTS,
};
use crate::errors::{AppError, AppResult};

/// Headline reason shown with a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReasonKind {
    Popular,
    Tags,
    Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Explanation {
    pub reason: ReasonKind,
    pub details: String,
}

/// One contributing factor, in the order it was evaluated.
#[derive(Debug, Clone, PartialEq)]
enum Contribution {
    Popular { favorites: i64 },
    Tags { matched: usize },
    Locality(Locality),
    Level(String),
}

impl Contribution {
    fn describe(&self) -> String {
        match self {
            Contribution::Popular { favorites } => format!("Popular ({} favoritos)", favorites),
            Contribution::Tags { matched } => format!("{} etiquetas coinciden", matched),
            Contribution::Locality(locality) => format!("En {}", locality),
            Contribution::Level(level) => format!("Nivel {}", level),
        }
    }
}

/// Score a single activity for an optional profile.
pub fn score_activity(activity: &Activity, profile: Option<&UserProfile>) -> (f64, Explanation) {
    let base = activity.normalized_popularity * POPULARITY_BASE_MULTIPLIER;

    let Some(profile) = profile else {
        return (
            base.min(MAX_RECOMMENDATION_SCORE),
            Explanation {
                reason: ReasonKind::Popular,
                details: "Actividad popular en la comunidad".to_string(),
            },
        );
    };

    let mut score = base;
    let mut contributions = Vec::new();

    if base > POPULAR_REASON_THRESHOLD {
        contributions.push(Contribution::Popular {
            favorites: activity.favorite_count,
        });
    }

    let interests: HashSet<&str> = profile.interest_tags.iter().map(String::as_str).collect();
    let matched = activity
        .tags
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .intersection(&interests)
        .count();
    if matched > 0 {
        score += (matched as f64 * TAG_MATCH_POINTS).min(TAG_MATCH_CAP);
        contributions.push(Contribution::Tags { matched });
    }

    if profile.preferred_locality == Some(activity.locality) {
        score += LOCALITY_MATCH_POINTS;
        contributions.push(Contribution::Locality(activity.locality));
    }

    if let (Some(level), Some(preferred)) = (activity.level, profile.preferred_level) {
        if level == preferred {
            score += LEVEL_MATCH_POINTS;
            contributions.push(Contribution::Level(level.to_string()));
        }
    }

    (score.min(MAX_RECOMMENDATION_SCORE), explain(&contributions))
}

fn explain(contributions: &[Contribution]) -> Explanation {
    if contributions.is_empty() {
        return Explanation {
            reason: ReasonKind::Popular,
            details: "Basado en popularidad general".to_string(),
        };
    }

    let tags = contributions
        .iter()
        .any(|c| matches!(c, Contribution::Tags { .. }));
    let locality = contributions
        .iter()
        .any(|c| matches!(c, Contribution::Locality(_)));
    let reason = if tags {
        ReasonKind::Tags
    } else if locality {
        ReasonKind::Location
    } else {
        ReasonKind::Popular
    };

    Explanation {
        reason,
        details: contributions
            .iter()
            .map(Contribution::describe)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Query filters accepted by the recommendation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecommendationQuery {
    /// Maximum number of items (1..=50, default 10)
    pub limit: Option<u64>,
    /// Category filter
    pub tipo: Option<Category>,
    /// Locality filter
    pub localidad: Option<Locality>,
    /// Drop the caller's favorites from the candidates
    #[serde(default)]
    pub exclude_favorited: bool,
}

impl RecommendationQuery {
    pub fn effective_limit(&self) -> AppResult<u64> {
        match self.limit {
            None => Ok(DEFAULT_RECOMMENDATION_LIMIT),
            Some(limit) if (1..=MAX_RECOMMENDATION_LIMIT).contains(&limit) => Ok(limit),
            Some(limit) => Err(AppError::validation(format!(
                "limit must be between 1 and {} (got {})",
                MAX_RECOMMENDATION_LIMIT, limit
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    pub actividad: Activity,
    pub score: f64,
    pub explanation: Explanation,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecommendationList {
    pub items: Vec<Recommendation>,
    pub total: usize,
    pub user_profile_complete: bool,
}

/// Sort by score descending, keeping input order among ties, then cut to `limit`.
pub fn rank(mut items: Vec<Recommendation>, limit: usize) -> Vec<Recommendation> {
    items.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    items.truncate(limit);
    items
}
