//! Source extraction: CSV or JSON payloads into raw records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};

/// One source row: field name to loosely-typed value.
pub type RawRecord = Map<String, Value>;

/// Payload format of an upload or import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    #[default]
    Csv,
    Json,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Json => "json",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            other => Err(AppError::bad_request(format!(
                "Unsupported format '{}', expected csv or json",
                other
            ))),
        }
    }
}

/// Parse a whole payload. Any structural problem fails the entire payload.
pub fn extract(format: SourceFormat, payload: &str) -> AppResult<Vec<RawRecord>> {
    let payload = payload.strip_prefix('\u{feff}').unwrap_or(payload);
    match format {
        SourceFormat::Csv => extract_csv(payload),
        SourceFormat::Json => extract_json(payload),
    }
}

fn extract_csv(payload: &str) -> AppResult<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(payload.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(header, field)| (header.clone(), Value::String(field.to_string())))
            .collect();
        records.push(record);
    }

    Ok(records)
}

fn extract_json(payload: &str) -> AppResult<Vec<RawRecord>> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| AppError::bad_request(format!("Invalid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(AppError::bad_request(
            "JSON payload must be an array of activities",
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            _ => Err(AppError::bad_request(format!(
                "Item {}: must be an object",
                index + 1
            ))),
        })
        .collect()
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::bad_request(format!("CSV parsing error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_become_string_records() {
        let payload = "\u{feff}titulo,precio\nCine,abc\nTeatro,5000\n";
        let records = extract(SourceFormat::Csv, payload).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["titulo"], Value::String("Cine".into()));
        assert_eq!(records[1]["precio"], Value::String("5000".into()));
    }

    #[test]
    fn short_csv_rows_leave_fields_absent() {
        let records = extract(SourceFormat::Csv, "titulo,descripcion,tipo\nCine,Funcion\n").unwrap();
        assert!(records[0].get("tipo").is_none());
    }

    #[test]
    fn json_requires_an_array_of_objects() {
        assert!(extract(SourceFormat::Json, r#"{"titulo": "Cine"}"#).is_err());
        assert!(extract(SourceFormat::Json, r#"[{"titulo": "Cine"}, 3]"#).is_err());

        let records = extract(SourceFormat::Json, r#"[{"titulo": "Cine", "precio": 0}]"#).unwrap();
        assert_eq!(records[0]["precio"], Value::from(0));
    }

    #[test]
    fn header_only_csv_has_no_records() {
        assert!(extract(SourceFormat::Csv, "titulo,tipo\n").unwrap().is_empty());
    }

    #[test]
    fn format_parsing_is_case_insensitive() {
        assert_eq!("CSV".parse::<SourceFormat>().unwrap(), SourceFormat::Csv);
        assert!("xml".parse::<SourceFormat>().is_err());
    }
}
