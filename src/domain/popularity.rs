//! Popularity math.
//!
//! `raw = favorites * 1.0 + views * 0.1`, then every raw score is divided by
//! the batch maximum (floored at 1.0) so the result lands in [0, 1].

use uuid::Uuid;

use crate::config::{FAVORITE_WEIGHT, MIN_POPULARITY_DENOMINATOR, VIEW_WEIGHT};

/// Aggregate counters of one activity, as read by the recalculation job.
#[derive(Debug, Clone, PartialEq)]
pub struct PopularityInput {
    pub activity_id: Uuid,
    pub favorite_count: i64,
    pub view_score: f64,
}

pub fn raw_score(favorite_count: i64, view_score: f64) -> f64 {
    favorite_count as f64 * FAVORITE_WEIGHT + view_score * VIEW_WEIGHT
}

/// Denominator for a batch: the largest raw score, never below the floor.
pub fn normalization_base(raw_scores: &[f64]) -> f64 {
    raw_scores
        .iter()
        .copied()
        .fold(MIN_POPULARITY_DENOMINATOR, f64::max)
}

/// Normalize raw scores against their own maximum.
pub fn normalize(raw_scores: &[f64]) -> Vec<f64> {
    let base = normalization_base(raw_scores);
    raw_scores.iter().map(|raw| raw / base).collect()
}
