//! Scheduled popularity recalculation.

use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::errors::{AppError, AppResult};
use crate::services::PopularityService;

/// Register the recalculation under a 6-field cron expression and start the
/// scheduler. The returned handle must stay alive for the job to keep firing.
pub async fn start_popularity_schedule(
    cron: &str,
    service: Arc<dyn PopularityService>,
) -> AppResult<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

    let job = Job::new_async(cron, move |_id, _scheduler| {
        let service = service.clone();
        Box::pin(async move {
            if let Err(e) = service.recalculate().await {
                tracing::error!(error = %e, "Scheduled popularity recalculation failed");
            }
        })
    })
    .map_err(|e| AppError::internal(format!("Invalid popularity schedule '{}': {}", cron, e)))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| AppError::internal(format!("Failed to register popularity job: {}", e)))?;
    scheduler
        .start()
        .await
        .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

    tracing::info!(cron = %cron, "Popularity schedule started");
    Ok(scheduler)
}
