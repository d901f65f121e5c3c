//! Activity aggregate and its creation shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::catalog::{ActivityLevel, ActivityStatus, Category, Locality};
use crate::config::{
    is_valid_category, is_valid_level, is_valid_locality, is_valid_status,
    FREE_WITH_PRICE_MESSAGE, STATUS_PENDING_VALIDATION,
};

/// A catalog entry as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub id: Uuid,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "tipo")]
    pub category: Category,
    #[serde(rename = "fecha_inicio")]
    pub start: DateTime<Utc>,
    #[serde(rename = "fecha_fin")]
    pub end: Option<DateTime<Utc>>,
    #[serde(rename = "ubicacion_direccion")]
    pub address: String,
    #[serde(rename = "ubicacion_lat")]
    pub latitude: f64,
    #[serde(rename = "ubicacion_lng")]
    pub longitude: f64,
    #[serde(rename = "localidad")]
    pub locality: Locality,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "es_gratis")]
    pub is_free: bool,
    #[serde(rename = "nivel_actividad")]
    pub level: Option<ActivityLevel>,
    #[serde(rename = "etiquetas")]
    pub tags: Vec<String>,
    #[serde(rename = "contacto")]
    pub contact: Option<String>,
    #[serde(rename = "enlace_externo")]
    pub external_link: Option<String>,
    pub imagen_url: Option<String>,
    #[serde(rename = "fuente")]
    pub source: String,
    #[serde(rename = "estado")]
    pub status: ActivityStatus,
    #[serde(rename = "popularidad_favoritos")]
    pub favorite_count: i64,
    #[serde(rename = "popularidad_vistas")]
    pub view_score: f64,
    #[serde(rename = "popularidad_normalizada")]
    pub normalized_popularity: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    pub fn is_active(&self) -> bool {
        self.status == ActivityStatus::Activa
    }

    /// The editable record behind this activity, status included.
    pub fn to_record(&self) -> NewActivity {
        NewActivity {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.as_str().to_string(),
            start: Some(self.start),
            end: self.end,
            address: self.address.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            locality: self.locality.as_str().to_string(),
            price: self.price,
            is_free: self.is_free,
            level: self.level.map(|l| l.as_str().to_string()),
            tags: self.tags.clone(),
            contact: self.contact.clone(),
            external_link: self.external_link.clone(),
            imagen_url: self.imagen_url.clone(),
            source: self.source.clone(),
            status: self.status.as_str().to_string(),
        }
    }
}

/// Canonical activity record: the output of the field mapper and the body of
/// a manual creation. Enumerated fields stay strings until validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_consistency"))]
pub struct NewActivity {
    #[serde(rename = "titulo")]
    #[validate(length(min = 3, max = 255, message = "must be between 3 and 255 characters"))]
    pub title: String,

    #[serde(rename = "descripcion")]
    #[validate(length(min = 10, message = "must be at least 10 characters"))]
    pub description: String,

    #[serde(rename = "tipo")]
    #[validate(custom(function = "validate_category"))]
    pub category: String,

    #[serde(rename = "fecha_inicio")]
    #[validate(required(message = "is required"))]
    pub start: Option<DateTime<Utc>>,

    #[serde(rename = "fecha_fin", default)]
    pub end: Option<DateTime<Utc>>,

    #[serde(rename = "ubicacion_direccion")]
    #[validate(length(min = 5, max = 500, message = "must be between 5 and 500 characters"))]
    pub address: String,

    #[serde(rename = "ubicacion_lat")]
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub latitude: f64,

    #[serde(rename = "ubicacion_lng")]
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub longitude: f64,

    #[serde(rename = "localidad")]
    #[validate(custom(function = "validate_locality"))]
    pub locality: String,

    #[serde(rename = "precio", default)]
    #[validate(range(min = 0.0, message = "must be zero or positive"))]
    pub price: f64,

    #[serde(rename = "es_gratis", default = "default_free")]
    pub is_free: bool,

    #[serde(rename = "nivel_actividad", default)]
    #[validate(custom(function = "validate_level"))]
    pub level: Option<String>,

    #[serde(rename = "etiquetas", default)]
    #[validate(length(min = 1, max = 10, message = "must contain between 1 and 10 tags"))]
    pub tags: Vec<String>,

    #[serde(rename = "contacto", default)]
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub contact: Option<String>,

    #[serde(rename = "enlace_externo", default)]
    #[validate(url(message = "must be a valid URL"))]
    pub external_link: Option<String>,

    #[serde(default)]
    #[validate(url(message = "must be a valid URL"))]
    pub imagen_url: Option<String>,

    #[serde(rename = "fuente", default = "default_source")]
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub source: String,

    #[serde(rename = "estado", default = "default_status")]
    #[validate(custom(function = "validate_status"))]
    pub status: String,
}

fn default_free() -> bool {
    true
}

fn default_source() -> String {
    "manual".to_string()
}

fn default_status() -> String {
    STATUS_PENDING_VALIDATION.to_string()
}

impl NewActivity {
    /// Trim free-text fields and lowercase the tag set, keeping first occurrences.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.address = self.address.trim().to_string();
        self.tags = normalize_tags(self.tags);
        self
    }

    /// Catalog identity used for duplicate detection.
    pub fn catalog_key(&self) -> Option<(&str, DateTime<Utc>, &str)> {
        self.start
            .map(|start| (self.title.as_str(), start, self.address.as_str()))
    }
}

/// Partial edit of an activity's catalog fields. Absent fields keep their
/// stored value. Status and popularity are changed through their own operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ActivityUpdate {
    #[serde(rename = "titulo", default)]
    #[validate(length(min = 3, max = 255, message = "must be between 3 and 255 characters"))]
    pub title: Option<String>,

    #[serde(rename = "descripcion", default)]
    #[validate(length(min = 10, message = "must be at least 10 characters"))]
    pub description: Option<String>,

    #[serde(rename = "tipo", default)]
    pub category: Option<Category>,

    #[serde(rename = "fecha_inicio", default)]
    pub start: Option<DateTime<Utc>>,

    #[serde(rename = "fecha_fin", default)]
    pub end: Option<DateTime<Utc>>,

    #[serde(rename = "ubicacion_direccion", default)]
    #[validate(length(min = 5, max = 500, message = "must be between 5 and 500 characters"))]
    pub address: Option<String>,

    #[serde(rename = "ubicacion_lat", default)]
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[serde(rename = "ubicacion_lng", default)]
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub longitude: Option<f64>,

    #[serde(rename = "localidad", default)]
    pub locality: Option<Locality>,

    #[serde(rename = "precio", default)]
    #[validate(range(min = 0.0, message = "must be zero or positive"))]
    pub price: Option<f64>,

    #[serde(rename = "es_gratis", default)]
    pub is_free: Option<bool>,

    #[serde(rename = "nivel_actividad", default)]
    pub level: Option<ActivityLevel>,

    #[serde(rename = "etiquetas", default)]
    #[validate(length(min = 1, max = 10, message = "must contain between 1 and 10 tags"))]
    pub tags: Option<Vec<String>>,

    #[serde(rename = "contacto", default)]
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub contact: Option<String>,

    #[serde(rename = "enlace_externo", default)]
    #[validate(url(message = "must be a valid URL"))]
    pub external_link: Option<String>,

    #[serde(default)]
    #[validate(url(message = "must be a valid URL"))]
    pub imagen_url: Option<String>,
}

impl ActivityUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay the provided fields onto `record`.
    pub fn apply(self, record: &mut NewActivity) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(category) = self.category {
            record.category = category.as_str().to_string();
        }
        if let Some(start) = self.start {
            record.start = Some(start);
        }
        if let Some(end) = self.end {
            record.end = Some(end);
        }
        if let Some(address) = self.address {
            record.address = address;
        }
        if let Some(latitude) = self.latitude {
            record.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            record.longitude = longitude;
        }
        if let Some(locality) = self.locality {
            record.locality = locality.as_str().to_string();
        }
        if let Some(price) = self.price {
            record.price = price;
        }
        if let Some(is_free) = self.is_free {
            record.is_free = is_free;
        }
        if let Some(level) = self.level {
            record.level = Some(level.as_str().to_string());
        }
        if let Some(tags) = self.tags {
            record.tags = tags;
        }
        if self.contact.is_some() {
            record.contact = self.contact;
        }
        if self.external_link.is_some() {
            record.external_link = self.external_link;
        }
        if self.imagen_url.is_some() {
            record.imagen_url = self.imagen_url;
        }
    }
}

/// Lowercase, trim, drop empties and de-duplicate a tag list.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

fn domain_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

fn validate_category(value: &str) -> Result<(), ValidationError> {
    if is_valid_category(value) {
        Ok(())
    } else {
        Err(domain_error(
            "category",
            format!("must be one of cultura, deporte, recreacion (got '{}')", value),
        ))
    }
}

fn validate_locality(value: &str) -> Result<(), ValidationError> {
    if is_valid_locality(value) {
        Ok(())
    } else {
        Err(domain_error(
            "locality",
            format!("must be one of Chapinero, Santa Fe, La Candelaria (got '{}')", value),
        ))
    }
}

fn validate_level(value: &str) -> Result<(), ValidationError> {
    if is_valid_level(value) {
        Ok(())
    } else {
        Err(domain_error(
            "level",
            format!("must be one of bajo, medio, alto (got '{}')", value),
        ))
    }
}

fn validate_status(value: &str) -> Result<(), ValidationError> {
    if is_valid_status(value) {
        Ok(())
    } else {
        Err(domain_error("status", format!("unknown status '{}'", value)))
    }
}

fn validate_consistency(record: &NewActivity) -> Result<(), ValidationError> {
    if record.is_free && record.price > 0.0 {
        return Err(domain_error("price_free", FREE_WITH_PRICE_MESSAGE.to_string()));
    }
    if let (Some(start), Some(end)) = (record.start, record.end) {
        if end < start {
            return Err(domain_error(
                "date_range",
                "fecha_fin must not be before fecha_inicio".to_string(),
            ));
        }
    }
    if record.tags.iter().any(|t| t.trim().is_empty()) {
        return Err(domain_error("tags", "etiquetas must not be blank".to_string()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// A record that passes strict validation.
    pub fn valid_record() -> NewActivity {
        NewActivity {
            title: "Concierto de jazz".to_string(),
            description: "Concierto al aire libre en el parque".to_string(),
            category: "cultura".to_string(),
            start: Some(Utc.with_ymd_and_hms(2025, 12, 1, 19, 0, 0).unwrap()),
            end: None,
            address: "Calle 60 # 7-20".to_string(),
            latitude: 4.65,
            longitude: -74.06,
            locality: "Chapinero".to_string(),
            price: 0.0,
            is_free: true,
            level: Some("bajo".to_string()),
            tags: vec!["musica".to_string(), "jazz".to_string()],
            contact: None,
            external_link: Some("https://example.org/jazz".to_string()),
            imagen_url: None,
            source: "manual".to_string(),
            status: "activa".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::valid_record;
    use super::*;
    use chrono::Duration;

    #[test]
    fn valid_record_passes() {
        assert!(valid_record().validate().is_ok());
    }

    #[test]
    fn free_activity_with_price_is_rejected() {
        let mut record = valid_record();
        record.price = 15000.0;
        let errors = record.validate().unwrap_err();
        let message = crate::errors::format_validation_errors(&errors);
        assert!(message.contains(FREE_WITH_PRICE_MESSAGE));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut record = valid_record();
        record.end = record.start.map(|s| s - Duration::hours(1));
        assert!(record.validate().is_err());
    }

    #[test]
    fn domain_values_are_enforced() {
        let mut record = valid_record();
        record.category = "teatro".to_string();
        record.locality = "Usaquén".to_string();
        record.level = Some("extremo".to_string());
        let errors = record.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("category"));
        assert!(fields.contains_key("locality"));
        assert!(fields.contains_key("level"));
    }

    #[test]
    fn tag_count_is_bounded() {
        let mut record = valid_record();
        record.tags = (0..11).map(|i| format!("tag{}", i)).collect();
        assert!(record.validate().is_err());
        record.tags.clear();
        assert!(record.validate().is_err());
    }

    #[test]
    fn missing_start_is_rejected() {
        let mut record = valid_record();
        record.start = None;
        assert!(record.validate().unwrap_err().field_errors().contains_key("start"));
    }

    #[test]
    fn update_overlays_only_the_given_fields() {
        let mut record = valid_record();
        let update = ActivityUpdate {
            title: Some("Concierto de rock".to_string()),
            locality: Some(Locality::SantaFe),
            price: Some(20000.0),
            is_free: Some(false),
            ..Default::default()
        };
        update.apply(&mut record);
        assert_eq!(record.title, "Concierto de rock");
        assert_eq!(record.locality, "Santa Fe");
        assert_eq!(record.price, 20000.0);
        assert!(!record.is_free);
        assert_eq!(record.description, valid_record().description);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn update_that_breaks_consistency_fails_on_the_merged_record() {
        let mut record = valid_record();
        let update = ActivityUpdate { price: Some(5000.0), ..Default::default() };
        assert!(update.validate().is_ok());
        update.apply(&mut record);
        assert!(record.validate().is_err());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(ActivityUpdate::default().is_empty());
        let update = ActivityUpdate { contact: Some("info@example.org".to_string()), ..Default::default() };
        assert!(!update.is_empty());
    }

    #[test]
    fn normalized_lowercases_and_dedupes_tags() {
        let mut record = valid_record();
        record.tags = vec![" Musica ".into(), "musica".into(), "JAZZ".into(), "".into()];
        assert_eq!(record.normalized().tags, vec!["musica", "jazz"]);
    }
}
