//! Per-batch bookkeeping: counters and per-record issues.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::config::{ETL_FIRST_ERROR_PREVIEW_LEN, ETL_LOGGED_ERROR_LEN, ETL_LOGGED_ERROR_SAMPLE};
use crate::domain::truncate_chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Failed validation
    Invalid,
    /// Repeated inside the same batch
    Duplicate,
    /// Already present in the catalog
    CatalogDuplicate,
    /// Valid, but the insert failed
    LoadFailed,
}

impl IssueKind {
    /// Whether the issue counts as an error in the execution summary.
    pub fn is_error(&self) -> bool {
        matches!(self, IssueKind::Invalid | IssueKind::LoadFailed)
    }
}

/// One record that did not make it into the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordIssue {
    /// 1-based position in the batch
    pub index: usize,
    pub title: String,
    pub kind: IssueKind,
    pub reason: String,
}

impl RecordIssue {
    pub fn describe(&self) -> String {
        match self.kind {
            IssueKind::LoadFailed => format!("Failed to load '{}': {}", self.title, self.reason),
            _ => format!("Record {} ('{}'): {}", self.index, self.title, self.reason),
        }
    }
}

/// Counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EtlReport {
    pub extracted: usize,
    pub cleaned: usize,
    pub valid: usize,
    pub invalid: usize,
    pub batch_duplicates: usize,
    pub catalog_duplicates: usize,
    pub loaded: usize,
    pub failed: usize,
    pub issues: Vec<RecordIssue>,
}

impl EtlReport {
    pub fn record(&mut self, issue: RecordIssue) {
        match issue.kind {
            IssueKind::Invalid => self.invalid += 1,
            IssueKind::Duplicate => self.batch_duplicates += 1,
            IssueKind::CatalogDuplicate => self.catalog_duplicates += 1,
            IssueKind::LoadFailed => self.failed += 1,
        }
        self.issues.push(issue);
    }

    pub fn errors(&self) -> impl Iterator<Item = &RecordIssue> {
        self.issues.iter().filter(|issue| issue.kind.is_error())
    }

    /// `"{n} errors occurred. First: {first}"`, or `None` for a clean batch.
    pub fn error_summary(&self) -> Option<String> {
        let count = self.errors().count();
        let first = self.errors().next()?;
        Some(format!(
            "{} errors occurred. First: {}",
            count,
            truncate_chars(&first.describe(), ETL_FIRST_ERROR_PREVIEW_LEN)
        ))
    }

    /// Records the execution stores as failed: invalid plus load failures.
    pub fn failed_records(&self) -> usize {
        self.invalid + self.failed
    }

    pub fn log_summary(&self, execution_id: uuid::Uuid) {
        info!(
            execution_id = %execution_id,
            extracted = self.extracted,
            valid = self.valid,
            invalid = self.invalid,
            batch_duplicates = self.batch_duplicates,
            catalog_duplicates = self.catalog_duplicates,
            loaded = self.loaded,
            failed = self.failed,
            "ETL batch finished"
        );
        for issue in self.errors().take(ETL_LOGGED_ERROR_SAMPLE) {
            warn!(
                execution_id = %execution_id,
                "{}",
                truncate_chars(&issue.describe(), ETL_LOGGED_ERROR_LEN)
            );
        }
    }
}
