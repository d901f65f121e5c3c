//! Field mapping: heterogeneous source records to `NewActivity`.
//!
//! The mapper never fails. Unknown categories fall back to `cultura`,
//! unknown localities to `Chapinero`, unusable coordinates to the city
//! center. An unparsable start date leaves `start` empty so the validator
//! rejects the record.

use chrono::Utc;
use tracing::warn;

use super::source::RawRecord;
use super::values::{datetime, first_present, first_text, number, tag_list, text, truthy};
use crate::config::{
    CATEGORY_SYNONYMS, CONTACT_SEPARATOR, DEFAULT_CATEGORY, DEFAULT_LATITUDE, DEFAULT_LONGITUDE,
    LOCALITIES, MIN_LOCALITY_ABBREVIATION, STATUS_PENDING_VALIDATION,
};
use crate::domain::{normalize_tags, NewActivity};

const TITLE_KEYS: &[&str] = &["nombre", "titulo"];
const DESCRIPTION_KEYS: &[&str] = &["descripcion"];
const CATEGORY_KEYS: &[&str] = &["tipo"];
const START_KEYS: &[&str] = &["fecha_inicio"];
const END_KEYS: &[&str] = &["fecha_fin"];
const ADDRESS_KEYS: &[&str] = &["direccion", "ubicacion_direccion"];
const LATITUDE_KEYS: &[&str] = &["ubicacion_lat", "lat"];
const LONGITUDE_KEYS: &[&str] = &["ubicacion_lng", "lng", "lon"];
const LOCALITY_KEYS: &[&str] = &["localidad"];
const PRICE_KEYS: &[&str] = &["precio"];
const FREE_KEYS: &[&str] = &["es_gratuita", "es_gratis"];
const LEVEL_KEYS: &[&str] = &["nivel_actividad"];
const TAG_KEYS: &[&str] = &["etiquetas"];
const PHONE_KEYS: &[&str] = &["contacto_telefono"];
const EMAIL_KEYS: &[&str] = &["contacto_email"];
const WEB_KEYS: &[&str] = &["contacto_web", "enlace_externo"];
const CONTACT_KEYS: &[&str] = &["contacto"];
const IMAGE_KEYS: &[&str] = &["imagen_url"];

/// Maps cleaned records of one batch, stamping them with the batch source label.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    source_label: String,
}

impl FieldMapper {
    pub fn new(source_label: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
        }
    }

    pub fn map(&self, record: &RawRecord) -> NewActivity {
        let category = map_category(first_text(record, CATEGORY_KEYS).as_deref());

        let start = match first_text(record, START_KEYS) {
            None => Some(Utc::now()),
            Some(raw) => {
                let parsed = datetime(&raw);
                if parsed.is_none() {
                    warn!(value = %raw, "Unparsable fecha_inicio");
                }
                parsed
            }
        };
        let end = first_text(record, END_KEYS).and_then(|raw| {
            let parsed = datetime(&raw);
            if parsed.is_none() {
                warn!(value = %raw, "Unparsable fecha_fin, dropping it");
            }
            parsed
        });

        let price = first_present(record, PRICE_KEYS)
            .and_then(number)
            .filter(|p| *p >= 0.0)
            .unwrap_or(0.0);
        let is_free = first_present(record, FREE_KEYS)
            .and_then(truthy)
            .unwrap_or(price == 0.0);

        let mut tags = first_present(record, TAG_KEYS)
            .map(|value| normalize_tags(tag_list(value)))
            .unwrap_or_default();
        if tags.is_empty() {
            tags.push(category.to_string());
        }

        NewActivity {
            title: first_text(record, TITLE_KEYS).unwrap_or_default(),
            description: first_text(record, DESCRIPTION_KEYS).unwrap_or_default(),
            category: category.to_string(),
            start,
            end,
            address: first_text(record, ADDRESS_KEYS).unwrap_or_default(),
            latitude: coordinate(record, LATITUDE_KEYS, -90.0..=90.0, DEFAULT_LATITUDE),
            longitude: coordinate(record, LONGITUDE_KEYS, -180.0..=180.0, DEFAULT_LONGITUDE),
            locality: map_locality(first_text(record, LOCALITY_KEYS).as_deref()).to_string(),
            price: if is_free { 0.0 } else { price },
            is_free,
            level: first_text(record, LEVEL_KEYS).map(|l| l.to_lowercase()),
            tags,
            contact: contact(record),
            external_link: first_text(record, WEB_KEYS),
            imagen_url: first_text(record, IMAGE_KEYS),
            source: self.source_label.clone(),
            status: STATUS_PENDING_VALIDATION.to_string(),
        }
    }
}

/// Canonical category for a raw value via the synonym table.
pub fn map_category(raw: Option<&str>) -> &'static str {
    let Some(raw) = raw else {
        return DEFAULT_CATEGORY;
    };
    let key = raw.trim().to_lowercase();
    CATEGORY_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Canonical locality for a raw value.
///
/// A canonical name contained in the input wins; otherwise an input of at
/// least three characters that starts a canonical name selects it.
pub fn map_locality(raw: Option<&str>) -> &'static str {
    let default = LOCALITIES[0];
    let Some(raw) = raw else {
        return default;
    };
    let input = raw.trim().to_lowercase();

    if let Some(found) = LOCALITIES
        .iter()
        .copied()
        .find(|name| input.contains(&name.to_lowercase()))
    {
        return found;
    }
    if input.chars().count() >= MIN_LOCALITY_ABBREVIATION {
        if let Some(found) = LOCALITIES
            .iter()
            .copied()
            .find(|name| name.to_lowercase().starts_with(&input))
        {
            return found;
        }
    }
    default
}

fn coordinate(
    record: &RawRecord,
    keys: &[&str],
    bounds: std::ops::RangeInclusive<f64>,
    fallback: f64,
) -> f64 {
    first_present(record, keys)
        .and_then(number)
        .filter(|value| bounds.contains(value))
        .unwrap_or(fallback)
}

fn contact(record: &RawRecord) -> Option<String> {
    let parts: Vec<String> = [("Tel", PHONE_KEYS), ("Email", EMAIL_KEYS), ("Web", WEB_KEYS)]
        .iter()
        .filter_map(|(label, keys)| {
            first_text(record, keys).map(|value| format!("{}: {}", label, value))
        })
        .collect();

    if parts.is_empty() {
        first_present(record, CONTACT_KEYS).and_then(text)
    } else {
        Some(parts.join(CONTACT_SEPARATOR))
    }
}
