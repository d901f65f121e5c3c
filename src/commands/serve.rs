//! `serve`: HTTP API plus, unless disabled, the embedded ETL worker and the
//! popularity schedule.

use std::sync::Arc;

use super::{connect_cache, connect_database};
use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::jobs::{run_etl_worker, start_popularity_schedule, ApalisEtlQueue};

pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    let database = connect_database(&config).await?;
    let cache = connect_cache(&config).await;
    let queue = ApalisEtlQueue::connect(&config).await?;

    let state = AppState::from_config(database, cache, Arc::new(queue.clone()), &config);

    if config.etl_embedded_worker {
        let etl = state.services.etl();
        tokio::spawn(async move {
            if let Err(e) = run_etl_worker(&queue, etl).await {
                tracing::error!(error = %e, "Embedded ETL worker stopped");
            }
        });
    }

    // Dropping the scheduler handle stops the schedule.
    let _scheduler = match config.popularity_cron.as_deref() {
        Some(cron) => Some(start_popularity_schedule(cron, state.services.popularity()).await?),
        None => {
            tracing::info!("Popularity schedule disabled");
            None
        }
    };

    let app = create_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}
