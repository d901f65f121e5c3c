//! Closed value sets of the activity catalog.
//!
//! String forms come from the versioned tables in `config::constants`, so the
//! wire format, the database and the ETL mapper all agree on one spelling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::config::{
    CATEGORY_CULTURA, CATEGORY_DEPORTE, CATEGORY_RECREACION, LOCALITIES, STATUS_ACTIVE,
    STATUS_INACTIVE, STATUS_PENDING_VALIDATION, STATUS_REJECTED,
};
use crate::errors::AppError;

/// Activity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cultura,
    Deporte,
    Recreacion,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cultura => CATEGORY_CULTURA,
            Category::Deporte => CATEGORY_DEPORTE,
            Category::Recreacion => CATEGORY_RECREACION,
        }
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CATEGORY_CULTURA => Ok(Category::Cultura),
            CATEGORY_DEPORTE => Ok(Category::Deporte),
            CATEGORY_RECREACION => Ok(Category::Recreacion),
            other => Err(AppError::validation(format!("Unknown category '{}'", other))),
        }
    }
}

/// City district used for filtering and profile matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Locality {
    #[serde(rename = "Chapinero")]
    Chapinero,
    #[serde(rename = "Santa Fe")]
    SantaFe,
    #[serde(rename = "La Candelaria")]
    LaCandelaria,
}

impl Locality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locality::Chapinero => LOCALITIES[0],
            Locality::SantaFe => LOCALITIES[1],
            Locality::LaCandelaria => LOCALITIES[2],
        }
    }
}

impl FromStr for Locality {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match LOCALITIES.iter().position(|l| *l == s) {
            Some(0) => Ok(Locality::Chapinero),
            Some(1) => Ok(Locality::SantaFe),
            Some(2) => Ok(Locality::LaCandelaria),
            _ => Err(AppError::validation(format!("Unknown locality '{}'", s))),
        }
    }
}

/// Physical intensity of an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Bajo,
    Medio,
    Alto,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Bajo => "bajo",
            ActivityLevel::Medio => "medio",
            ActivityLevel::Alto => "alto",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bajo" => Ok(ActivityLevel::Bajo),
            "medio" => Ok(ActivityLevel::Medio),
            "alto" => Ok(ActivityLevel::Alto),
            other => Err(AppError::validation(format!("Unknown activity level '{}'", other))),
        }
    }
}

/// Activity lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Activa,
    PendienteValidacion,
    Rechazada,
    Inactiva,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Activa => STATUS_ACTIVE,
            ActivityStatus::PendienteValidacion => STATUS_PENDING_VALIDATION,
            ActivityStatus::Rechazada => STATUS_REJECTED,
            ActivityStatus::Inactiva => STATUS_INACTIVE,
        }
    }

    /// Admin-controlled transitions. Imports wait in pending until moderated;
    /// soft delete (active to inactive) cannot be undone through the API.
    pub fn can_transition_to(&self, next: ActivityStatus) -> bool {
        matches!(
            (self, next),
            (ActivityStatus::PendienteValidacion, ActivityStatus::Activa)
                | (ActivityStatus::PendienteValidacion, ActivityStatus::Rechazada)
                | (ActivityStatus::Activa, ActivityStatus::Inactiva)
        )
    }
}

impl FromStr for ActivityStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_ACTIVE => Ok(ActivityStatus::Activa),
            STATUS_PENDING_VALIDATION => Ok(ActivityStatus::PendienteValidacion),
            STATUS_REJECTED => Ok(ActivityStatus::Rechazada),
            STATUS_INACTIVE => Ok(ActivityStatus::Inactiva),
            other => Err(AppError::validation(format!("Unknown status '{}'", other))),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Category, Locality, ActivityLevel, ActivityStatus);
