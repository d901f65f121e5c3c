use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A saved (user, activity) pair. Unique per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Favorite {
    pub id: Uuid,
    #[serde(rename = "usuario_id")]
    pub user_id: Uuid,
    #[serde(rename = "actividad_id")]
    pub activity_id: Uuid,
    #[serde(rename = "fecha_guardado")]
    pub saved_at: DateTime<Utc>,
}
