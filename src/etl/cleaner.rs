//! Record cleaning: whitespace collapse, edge punctuation, empty to null.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::source::RawRecord;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

const EDGE_PUNCTUATION: &[char] = &['.', ',', ';', ':'];

/// Clean every record of a batch. Record count and order are preserved.
pub fn clean_records(records: Vec<RawRecord>) -> Vec<RawRecord> {
    records.into_iter().map(clean_record).collect()
}

pub fn clean_record(record: RawRecord) -> RawRecord {
    record
        .into_iter()
        .map(|(key, value)| (key, clean_value(value)))
        .collect()
}

fn clean_value(value: Value) -> Value {
    match value {
        Value::String(s) => clean_text(&s).map(Value::String).unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_value).collect()),
        other => other,
    }
}

fn clean_text(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE_RUN.replace_all(raw.trim(), " ");
    let cleaned = collapsed.trim_matches(EDGE_PUNCTUATION).trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
