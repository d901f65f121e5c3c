//! Batch ingestion stages: extract, clean, map, validate, deduplicate.
//!
//! Everything here is pure. Persistence and execution bookkeeping live in
//! `services::etl_service`.

pub mod cleaner;
pub mod dedup;
pub mod mapper;
pub mod report;
pub mod source;
pub mod strict;
pub mod validator;
mod values;

pub use cleaner::{clean_record, clean_records};
pub use dedup::{fingerprint, BatchDeduplicator};
pub use mapper::{map_category, map_locality, FieldMapper};
pub use report::{EtlReport, IssueKind, RecordIssue};
pub use source::{extract, RawRecord, SourceFormat};
pub use strict::parse_import_row;
pub use validator::validate_record;
