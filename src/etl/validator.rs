//! Strict validation of mapped records.

use validator::Validate;

use super::report::{IssueKind, RecordIssue};
use crate::domain::NewActivity;
use crate::errors::format_validation_errors;

/// Validate a mapped record. `index` is the 1-based batch position.
pub fn validate_record(index: usize, record: &NewActivity) -> Result<(), RecordIssue> {
    record.validate().map_err(|errors| RecordIssue {
        index,
        title: record.title.clone(),
        kind: IssueKind::Invalid,
        reason: format_validation_errors(&errors),
    })
}
