//! Loose value readers shared by the mapper and the strict import parser.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::source::RawRecord;
use crate::config::{DATETIME_FORMATS, DATETIME_OFFSET_FORMATS, DATE_FORMATS, TRUTHY_VALUES};

/// Non-empty textual form of a value. Numbers and booleans are rendered.
pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First key (in order) holding a non-empty value.
pub(crate) fn first_text(record: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| record.get(*key).and_then(text))
}

/// First key (in order) that is present and not null, with its raw value.
pub(crate) fn first_present<'a>(record: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

/// Finite number from a JSON number or a numeric string.
pub(crate) fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Boolean reading of a flag: real booleans, non-zero numbers, or a truthy string.
pub(crate) fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => Some(TRUTHY_VALUES.contains(&s.trim().to_lowercase().as_str())),
        _ => None,
    }
}

/// Tags from a list, or from a comma/semicolon separated string with quotes stripped.
pub(crate) fn tag_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::String(s) => s
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .split([',', ';'])
            .map(|t| t.trim().trim_matches(|c| c == '"' || c == '\'').trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse a timestamp in any supported layout. Naive values are UTC and
/// date-only values land on midnight.
pub(crate) fn datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATETIME_OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    None
}
