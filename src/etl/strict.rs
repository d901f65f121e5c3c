//! Strict row parsing for the synchronous admin import.
//!
//! Unlike the mapper, nothing is defaulted or coerced: a missing required
//! field or an unreadable value rejects the row.

use super::source::RawRecord;
use super::values::{datetime, first_present, number, tag_list, text, truthy};
use crate::config::{IMPORT_SOURCE_LABEL, STATUS_PENDING_VALIDATION};
use crate::domain::{normalize_tags, NewActivity};

const REQUIRED_FIELDS: &[&str] = &[
    "titulo",
    "descripcion",
    "tipo",
    "fecha_inicio",
    "ubicacion_direccion",
    "ubicacion_lat",
    "ubicacion_lng",
    "localidad",
];

fn field(record: &RawRecord, key: &str) -> Option<String> {
    record.get(key).and_then(text)
}

/// Parse one import row. The error string is reported verbatim per row.
pub fn parse_import_row(record: &RawRecord) -> Result<NewActivity, String> {
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|key| field(record, key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(format!("Missing required fields: {}", missing.join(", ")));
    }

    let start_raw = field(record, "fecha_inicio").unwrap_or_default();
    let start = datetime(&start_raw)
        .ok_or_else(|| format!("Invalid date format for fecha_inicio: '{}'", start_raw))?;
    let end = match field(record, "fecha_fin") {
        Some(raw) => Some(
            datetime(&raw).ok_or_else(|| format!("Invalid date format for fecha_fin: '{}'", raw))?,
        ),
        None => None,
    };

    let latitude = record.get("ubicacion_lat").and_then(number);
    let longitude = record.get("ubicacion_lng").and_then(number);
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err("Invalid coordinates format".to_string());
    };

    let price = match first_present(record, &["precio"]) {
        Some(value) => number(value).ok_or_else(|| "Invalid price format".to_string())?,
        None => 0.0,
    };
    let is_free = first_present(record, &["es_gratis"])
        .and_then(truthy)
        .unwrap_or(true);

    Ok(NewActivity {
        title: field(record, "titulo").unwrap_or_default(),
        description: field(record, "descripcion").unwrap_or_default(),
        category: field(record, "tipo").unwrap_or_default().to_lowercase(),
        start: Some(start),
        end,
        address: field(record, "ubicacion_direccion").unwrap_or_default(),
        latitude,
        longitude,
        locality: field(record, "localidad").unwrap_or_default(),
        price,
        is_free,
        level: field(record, "nivel_actividad").map(|l| l.to_lowercase()),
        tags: first_present(record, &["etiquetas"])
            .map(|value| normalize_tags(tag_list(value)))
            .unwrap_or_default(),
        contact: field(record, "contacto"),
        external_link: field(record, "enlace_externo"),
        imagen_url: field(record, "imagen_url"),
        source: IMPORT_SOURCE_LABEL.to_string(),
        status: STATUS_PENDING_VALIDATION.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn row(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn complete_row() -> Value {
        json!({
            "titulo": "Yoga en el parque",
            "descripcion": "Sesión abierta de yoga para todos",
            "tipo": "Deporte",
            "fecha_inicio": "2025-11-15 08:00:00",
            "ubicacion_direccion": "Parque de los Periodistas",
            "ubicacion_lat": "4.6021",
            "ubicacion_lng": "-74.0705",
            "localidad": "Santa Fe",
            "etiquetas": "yoga,bienestar",
        })
    }

    #[test]
    fn complete_row_parses() {
        let parsed = parse_import_row(&row(complete_row())).unwrap();
        assert_eq!(parsed.category, "deporte");
        assert_eq!(parsed.tags, vec!["yoga", "bienestar"]);
        assert!(parsed.is_free);
        assert_eq!(parsed.source, "import");
        assert_eq!(parsed.status, "pendiente_validacion");
    }

    #[test]
    fn missing_fields_are_listed() {
        let err = parse_import_row(&row(json!({ "titulo": "Yoga", "tipo": "" }))).unwrap_err();
        assert!(err.starts_with("Missing required fields: descripcion, tipo"));
    }

    #[test]
    fn unreadable_coordinates_reject_the_row() {
        let mut value = complete_row();
        value["ubicacion_lat"] = json!("norte");
        let err = parse_import_row(&row(value)).unwrap_err();
        assert_eq!(err, "Invalid coordinates format");
    }

    #[test]
    fn explicit_free_flag_is_kept() {
        let mut value = complete_row();
        value["es_gratis"] = json!("false");
        value["precio"] = json!("20000");
        let parsed = parse_import_row(&row(value)).unwrap();
        assert!(!parsed.is_free);
        assert_eq!(parsed.price, 20000.0);
    }
}
