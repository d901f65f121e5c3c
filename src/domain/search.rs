//! Public catalog browsing: filters, ordering and the listing shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::activity::{normalize_tags, Activity};
use super::catalog::{ActivityLevel, Category, Locality};
use super::etl_execution::truncate_chars;
use crate::config::SUMMARY_DESCRIPTION_MAX_LEN;

/// Column the catalog listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    FechaInicio,
    Popularidad,
    Precio,
    Titulo,
    Tipo,
    Localidad,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Query filters accepted by the public catalog listing. Only active
/// activities are ever returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
#[validate(schema(function = "validate_ranges"))]
pub struct ActivitySearch {
    /// Case-insensitive text matched against title, description and tags
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub q: Option<String>,
    pub tipo: Option<Category>,
    pub localidad: Option<Locality>,
    /// Earliest start date (inclusive)
    pub fecha_desde: Option<DateTime<Utc>>,
    /// Latest start date (inclusive)
    pub fecha_hasta: Option<DateTime<Utc>>,
    #[validate(range(min = 0.0, message = "must be zero or positive"))]
    pub precio_min: Option<f64>,
    #[validate(range(min = 0.0, message = "must be zero or positive"))]
    pub precio_max: Option<f64>,
    pub es_gratis: Option<bool>,
    pub nivel_actividad: Option<ActivityLevel>,
    /// Comma-separated tags; an activity matches when it carries any of them
    pub etiquetas: Option<String>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl ActivitySearch {
    /// Lowercased search text, if any survives trimming.
    pub fn text(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty())
    }

    pub fn tags(&self) -> Vec<String> {
        self.etiquetas
            .as_deref()
            .map(|raw| normalize_tags(raw.split(',')))
            .unwrap_or_default()
    }

    /// In-memory form of the filter, used by non-SQL stores and tests.
    pub fn matches(&self, activity: &Activity) -> bool {
        if !activity.is_active() {
            return false;
        }
        if let Some(text) = self.text() {
            let hit = activity.title.to_lowercase().contains(&text)
                || activity.description.to_lowercase().contains(&text)
                || activity.tags.iter().any(|t| t.to_lowercase().contains(&text));
            if !hit {
                return false;
            }
        }
        if self.tipo.is_some_and(|c| c != activity.category)
            || self.localidad.is_some_and(|l| l != activity.locality)
            || self.es_gratis.is_some_and(|f| f != activity.is_free)
            || self.nivel_actividad.is_some_and(|l| Some(l) != activity.level)
        {
            return false;
        }
        if self.fecha_desde.is_some_and(|d| activity.start < d)
            || self.fecha_hasta.is_some_and(|d| activity.start > d)
            || self.precio_min.is_some_and(|p| activity.price < p)
            || self.precio_max.is_some_and(|p| activity.price > p)
        {
            return false;
        }
        let tags = self.tags();
        tags.is_empty() || tags.iter().any(|t| activity.tags.contains(t))
    }
}

fn range_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn validate_ranges(search: &ActivitySearch) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (search.precio_min, search.precio_max) {
        if min > max {
            return Err(range_error("price_range", "precio_min must not exceed precio_max"));
        }
    }
    if let (Some(from), Some(to)) = (search.fecha_desde, search.fecha_hasta) {
        if from > to {
            return Err(range_error("date_range", "fecha_desde must not be after fecha_hasta"));
        }
    }
    Ok(())
}

/// Listing entry: the card fields plus a shortened description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivitySummary {
    pub id: Uuid,
    pub titulo: String,
    pub descripcion_corta: String,
    pub tipo: Category,
    pub fecha_inicio: DateTime<Utc>,
    pub localidad: Locality,
    pub precio: f64,
    pub es_gratis: bool,
    pub nivel_actividad: Option<ActivityLevel>,
    pub etiquetas: Vec<String>,
    pub imagen_url: Option<String>,
    pub popularidad_normalizada: f64,
}

impl From<Activity> for ActivitySummary {
    fn from(activity: Activity) -> Self {
        let descripcion_corta =
            if activity.description.chars().count() > SUMMARY_DESCRIPTION_MAX_LEN {
                format!(
                    "{}...",
                    truncate_chars(&activity.description, SUMMARY_DESCRIPTION_MAX_LEN)
                )
            } else {
                activity.description
            };
        Self {
            id: activity.id,
            titulo: activity.title,
            descripcion_corta,
            tipo: activity.category,
            fecha_inicio: activity.start,
            localidad: activity.locality,
            precio: activity.price,
            es_gratis: activity.is_free,
            nivel_actividad: activity.level,
            etiquetas: activity.tags,
            imagen_url: activity.imagen_url,
            popularidad_normalizada: activity.normalized_popularity,
        }
    }
}
