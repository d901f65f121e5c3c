//! ETL batch job: payload, queue submission and worker handler.

use apalis::prelude::{Data, Monitor, Storage, WorkerBuilder, WorkerFactoryFn};
use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::PgPoolOptions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{Config, JOB_NAME_ETL, JOB_QUEUE_MAX_CONNECTIONS};
use crate::errors::{AppError, AppResult};
use crate::etl::SourceFormat;
use crate::services::EtlService;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// One uploaded batch waiting to be processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlJob {
    pub execution_id: Uuid,
    pub format: SourceFormat,
    pub payload: String,
}

/// Hands a batch to whatever runs it.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EtlDispatcher: Send + Sync {
    async fn dispatch(&self, job: EtlJob) -> AppResult<()>;
}

/// Apalis queue backed by the application database.
#[derive(Clone)]
pub struct ApalisEtlQueue {
    storage: PostgresStorage<EtlJob>,
}

impl ApalisEtlQueue {
    /// Connect a dedicated pool and create the queue tables if needed.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(JOB_QUEUE_MAX_CONNECTIONS)
            .connect(&config.database_url)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to connect job queue: {}", e)))?;

        PostgresStorage::setup(&pool)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to set up job storage: {}", e)))?;

        Ok(Self {
            storage: PostgresStorage::new(pool),
        })
    }

    /// Storage handle for building a worker
    pub fn storage(&self) -> PostgresStorage<EtlJob> {
        self.storage.clone()
    }
}

#[async_trait]
impl EtlDispatcher for ApalisEtlQueue {
    async fn dispatch(&self, job: EtlJob) -> AppResult<()> {
        let execution_id = job.execution_id;
        let mut storage = self.storage.clone();
        storage
            .push(job)
            .await
            .map_err(|e| AppError::Queue(e.to_string()))?;
        tracing::info!(execution_id = %execution_id, "ETL job queued");
        Ok(())
    }
}

/// Dispatcher for processes that only run batches inline, such as the
/// `etl run` command.
pub struct NoQueue;

#[async_trait]
impl EtlDispatcher for NoQueue {
    async fn dispatch(&self, job: EtlJob) -> AppResult<()> {
        Err(AppError::Queue(format!(
            "No job queue in this process for execution {}",
            job.execution_id
        )))
    }
}

/// Worker entry point for queued batches.
pub async fn etl_job_handler(job: EtlJob, service: Data<Arc<dyn EtlService>>) -> Result<(), AppError> {
    tracing::info!(execution_id = %job.execution_id, format = %job.format, "Processing ETL job");
    let execution = service.run(job).await?;
    tracing::info!(
        execution_id = %execution.id,
        status = %execution.status,
        loaded = execution.records_loaded,
        "ETL job finished"
    );
    Ok(())
}

/// Process queued batches until the monitor stops or Ctrl+C arrives.
pub async fn run_etl_worker(queue: &ApalisEtlQueue, service: Arc<dyn EtlService>) -> AppResult<()> {
    let worker = WorkerBuilder::new(JOB_NAME_ETL)
        .data(service)
        .backend(queue.storage())
        .build_fn(etl_job_handler);
    let monitor = Monitor::new().register(worker);

    tracing::info!("ETL worker started");
    tokio::select! {
        result = monitor.run() => {
            result.map_err(|e| AppError::Queue(format!("ETL worker failed: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping ETL worker");
        }
    }
    Ok(())
}
