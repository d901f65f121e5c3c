//! ETL orchestration.
//!
//! A batch moves its execution record pending -> running -> terminal and
//! saves it after every phase, so a crash leaves an inspectable row. Record
//! level problems (invalid, duplicate, failed insert) are collected in the
//! report and never stop the batch. Only an unreadable payload, an empty
//! extraction, zero valid records or an unexpected error fail it.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::CATALOG_TABLES_VERSION;
use crate::domain::{EtlExecution, EtlStatus, NewActivity};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::etl::{
    clean_records, extract, validate_record, BatchDeduplicator, EtlReport, FieldMapper, IssueKind,
    RecordIssue, SourceFormat,
};
use crate::infra::{InsertOutcome, UnitOfWork};
use crate::jobs::{EtlDispatcher, EtlJob};
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// An uploaded batch as received from an admin
#[derive(Debug, Clone, PartialEq)]
pub struct EtlUpload {
    pub admin_id: Uuid,
    pub format: SourceFormat,
    pub filename: Option<String>,
    pub source: String,
    pub payload: String,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EtlService: Send + Sync {
    /// Record a pending execution and queue the batch
    async fn trigger(&self, upload: EtlUpload) -> AppResult<EtlExecution>;

    /// Process a queued batch. Executions no longer pending are skipped.
    async fn run(&self, job: EtlJob) -> AppResult<EtlExecution>;

    /// Create and process a batch in the calling task
    async fn run_inline(
        &self,
        source: String,
        format: SourceFormat,
        payload: String,
        triggered_by: String,
    ) -> AppResult<(EtlExecution, EtlReport)>;

    async fn get(&self, id: Uuid) -> AppResult<EtlExecution>;

    async fn list(&self, page: PaginationParams) -> AppResult<Paginated<EtlExecution>>;

    /// pending -> cancelled
    async fn cancel(&self, id: Uuid) -> AppResult<EtlExecution>;
}

pub struct EtlManager<U: UnitOfWork> {
    uow: Arc<U>,
    dispatcher: Arc<dyn EtlDispatcher>,
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

impl<U: UnitOfWork> EtlManager<U> {
    pub fn new(uow: Arc<U>, dispatcher: Arc<dyn EtlDispatcher>) -> Self {
        Self { uow, dispatcher }
    }

    async fn save(&self, execution: &EtlExecution) -> AppResult<()> {
        self.uow.executions().save(execution.clone()).await.map(|_| ())
    }

    /// Fail the execution with a batch-level message and persist the report.
    async fn abort(
        &self,
        execution: &mut EtlExecution,
        report: &EtlReport,
        message: &str,
    ) -> AppResult<()> {
        tracing::error!(execution_id = %execution.id, reason = %message, "ETL batch failed");
        execution.details = serde_json::to_value(report).ok();
        execution.fail(message)?;
        self.save(execution).await
    }

    /// Map, validate and de-duplicate. Returns the records to load with
    /// their 1-based batch positions.
    fn transform(
        &self,
        source: &str,
        records: &[crate::etl::RawRecord],
        report: &mut EtlReport,
    ) -> Vec<(usize, NewActivity)> {
        let mapper = FieldMapper::new(source);
        let mut seen = BatchDeduplicator::new();
        let mut accepted = Vec::new();

        for (position, raw) in records.iter().enumerate() {
            let index = position + 1;
            let record = mapper.map(raw);

            if let Err(issue) = validate_record(index, &record) {
                report.record(issue);
                continue;
            }
            if !seen.admit(&record) {
                report.record(RecordIssue {
                    index,
                    title: record.title.clone(),
                    kind: IssueKind::Duplicate,
                    reason: "Duplicate of an earlier record in this batch".to_string(),
                });
                continue;
            }
            accepted.push((index, record));
        }

        report.valid = accepted.len();
        accepted
    }

    /// Insert records one by one. Each insert commits on its own, so a
    /// failure only loses that record.
    async fn load(&self, records: Vec<(usize, NewActivity)>, report: &mut EtlReport) {
        let activities = self.uow.activities();

        for (index, record) in records {
            let title = record.title.clone();
            let catalog_issue = |reason: &str| RecordIssue {
                index,
                title: title.clone(),
                kind: IssueKind::CatalogDuplicate,
                reason: reason.to_string(),
            };
            let load_failed = |error: AppError| {
                tracing::warn!(index, title = %title, error = %error, "Record failed to load");
                RecordIssue {
                    index,
                    title: title.clone(),
                    kind: IssueKind::LoadFailed,
                    reason: error.to_string(),
                }
            };

            if let Some((key_title, start, address)) = record.catalog_key() {
                match activities.exists_in_catalog(key_title, start, address).await {
                    Ok(false) => {}
                    Ok(true) => {
                        report.record(catalog_issue("Already in the catalog"));
                        continue;
                    }
                    Err(e) => {
                        report.record(load_failed(e));
                        continue;
                    }
                }
            }

            match activities.insert(record).await {
                Ok(InsertOutcome::Inserted(activity)) => {
                    tracing::debug!(activity_id = %activity.id, index, "Record loaded");
                    report.loaded += 1;
                }
                Ok(InsertOutcome::Duplicate) => {
                    report.record(catalog_issue("Already in the catalog (unique index)"))
                }
                Err(e) => report.record(load_failed(e)),
            }
        }
    }

    /// The batch proper. Batch-fatal conditions are handled here and leave
    /// the execution failed; an `Err` means an unexpected error escaped.
    async fn pipeline(
        &self,
        execution: &mut EtlExecution,
        format: SourceFormat,
        payload: &str,
    ) -> AppResult<EtlReport> {
        let mut report = EtlReport::default();

        execution.start()?;
        self.save(execution).await?;
        tracing::info!(
            execution_id = %execution.id,
            source = %execution.source,
            format = %format,
            catalog_version = CATALOG_TABLES_VERSION,
            "ETL batch started"
        );

        let records = match extract(format, payload) {
            Ok(records) => records,
            Err(e) => {
                self.abort(execution, &report, &e.user_message()).await?;
                return Ok(report);
            }
        };
        report.extracted = records.len();
        execution.records_extracted = count(report.extracted);
        self.save(execution).await?;
        tracing::info!(execution_id = %execution.id, extracted = report.extracted, "Extraction finished");

        if records.is_empty() {
            let message = format!("No records extracted from {}", format.as_str().to_uppercase());
            self.abort(execution, &report, &message).await?;
            return Ok(report);
        }

        let cleaned = clean_records(records);
        report.cleaned = cleaned.len();

        let accepted = self.transform(&execution.source, &cleaned, &mut report);
        execution.records_transformed = count(report.valid);
        execution.records_failed = count(report.failed_records());
        self.save(execution).await?;
        tracing::info!(
            execution_id = %execution.id,
            valid = report.valid,
            invalid = report.invalid,
            duplicates = report.batch_duplicates,
            "Transformation finished"
        );

        if accepted.is_empty() {
            self.abort(execution, &report, "No valid records after validation")
                .await?;
            return Ok(report);
        }

        let current = self
            .uow
            .executions()
            .find_by_id(execution.id)
            .await?
            .ok_or_not_found()?;
        if current.status == EtlStatus::Cancelled {
            tracing::info!(execution_id = %execution.id, "ETL batch cancelled before load");
            *execution = current;
            return Ok(report);
        }

        self.load(accepted, &mut report).await;

        execution.records_loaded = count(report.loaded);
        execution.records_failed = count(report.failed_records());
        execution.details = serde_json::to_value(&report).ok();
        execution.succeed(report.error_summary())?;
        self.save(execution).await?;

        report.log_summary(execution.id);
        Ok(report)
    }

    /// Best-effort failure marking after an unexpected error. Tries the
    /// in-memory record first, then a freshly read one.
    async fn mark_failed(&self, execution: &EtlExecution, error: &AppError) {
        let message = error.to_string();

        let mut snapshot = execution.clone();
        if snapshot.fail(&message).is_ok() && self.save(&snapshot).await.is_ok() {
            return;
        }

        match self.uow.executions().find_by_id(execution.id).await {
            Ok(Some(mut fresh)) if !fresh.status.is_terminal() => {
                let saved = match fresh.fail(&message) {
                    Ok(()) => self.save(&fresh).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = saved {
                    tracing::error!(execution_id = %execution.id, error = %e, "Could not mark ETL execution failed");
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(execution_id = %execution.id, error = %e, "Could not reload ETL execution")
            }
        }
    }

    async fn process(
        &self,
        mut execution: EtlExecution,
        format: SourceFormat,
        payload: &str,
    ) -> AppResult<(EtlExecution, EtlReport)> {
        match self.pipeline(&mut execution, format, payload).await {
            Ok(report) => Ok((execution, report)),
            Err(e) => {
                tracing::error!(execution_id = %execution.id, error = %e, "ETL batch aborted");
                self.mark_failed(&execution, &e).await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> EtlService for EtlManager<U> {
    async fn trigger(&self, upload: EtlUpload) -> AppResult<EtlExecution> {
        if upload.payload.trim().is_empty() {
            return Err(AppError::bad_request("Uploaded file is empty"));
        }

        let mut config = Map::new();
        config.insert("format".into(), json!(upload.format));
        if let Some(filename) = &upload.filename {
            config.insert("filename".into(), json!(filename));
        }
        config.insert("size_bytes".into(), json!(upload.payload.len()));

        let execution = EtlExecution::new(
            upload.source,
            format!("admin:{}", upload.admin_id),
            Some(Value::Object(config)),
        );
        let mut execution = self.uow.executions().create(execution).await?;

        let job = EtlJob {
            execution_id: execution.id,
            format: upload.format,
            payload: upload.payload,
        };
        if let Err(e) = self.dispatcher.dispatch(job).await {
            tracing::error!(execution_id = %execution.id, error = %e, "Failed to queue ETL job");
            execution.fail(&format!("Failed to queue ETL job: {}", e))?;
            self.save(&execution).await?;
            return Err(e);
        }

        Ok(execution)
    }

    async fn run(&self, job: EtlJob) -> AppResult<EtlExecution> {
        let execution = self.get(job.execution_id).await?;
        if execution.status != EtlStatus::Pending {
            tracing::info!(execution_id = %execution.id, status = %execution.status, "Skipping ETL job, execution is not pending");
            return Ok(execution);
        }

        self.process(execution, job.format, &job.payload)
            .await
            .map(|(execution, _)| execution)
    }

    async fn run_inline(
        &self,
        source: String,
        format: SourceFormat,
        payload: String,
        triggered_by: String,
    ) -> AppResult<(EtlExecution, EtlReport)> {
        let config = json!({ "format": format, "size_bytes": payload.len() });
        let execution = self
            .uow
            .executions()
            .create(EtlExecution::new(source, triggered_by, Some(config)))
            .await?;
        self.process(execution, format, &payload).await
    }

    async fn get(&self, id: Uuid) -> AppResult<EtlExecution> {
        self.uow.executions().find_by_id(id).await?.ok_or_not_found()
    }

    async fn list(&self, page: PaginationParams) -> AppResult<Paginated<EtlExecution>> {
        let (items, total) = self.uow.executions().list_recent(page.clone()).await?;
        Ok(Paginated::new(items, &page, total))
    }

    async fn cancel(&self, id: Uuid) -> AppResult<EtlExecution> {
        let mut execution = self.get(id).await?;
        if execution.status != EtlStatus::Pending {
            return Err(AppError::invalid_state(format!(
                "Only pending executions can be cancelled (status: {})",
                execution.status
            )));
        }
        execution.cancel()?;
        self.save(&execution).await?;
        tracing::info!(execution_id = %id, "ETL execution cancelled");
        Ok(execution)
    }
}
