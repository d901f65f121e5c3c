//! User preference profile, read by the recommendation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::catalog::{ActivityLevel, Locality};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    #[serde(rename = "usuario_id")]
    pub user_id: Uuid,
    #[serde(rename = "etiquetas_interes")]
    pub interest_tags: Vec<String>,
    #[serde(rename = "localidad_preferida")]
    pub preferred_locality: Option<Locality>,
    #[serde(rename = "nivel_actividad")]
    pub preferred_level: Option<ActivityLevel>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            interest_tags: Vec::new(),
            preferred_locality: None,
            preferred_level: None,
            updated_at: Utc::now(),
        }
    }

    /// At least one preference is set, whether or not it matches anything.
    pub fn is_complete(&self) -> bool {
        !self.interest_tags.is_empty()
            || self.preferred_locality.is_some()
            || self.preferred_level.is_some()
    }
}
