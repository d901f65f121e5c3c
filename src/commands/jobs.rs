//! `jobs work` runs a standalone ETL worker; `jobs popularity` recalculates
//! popularity once, for use from an external cron.

use std::sync::Arc;

use super::{connect_cache, connect_database, persistence};
use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::Config;
use crate::errors::AppResult;
use crate::jobs::{run_etl_worker, ApalisEtlQueue};
use crate::services::{PopularityManager, PopularityService, ServiceContainer, Services};

pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => work(&config).await,
        JobsAction::Popularity => popularity(&config).await,
    }
}

async fn work(config: &Config) -> AppResult<()> {
    let database = connect_database(config).await?;
    let cache = connect_cache(config).await;
    let queue = ApalisEtlQueue::connect(config).await?;

    let services = Services::build(
        persistence(&database),
        cache,
        Arc::new(queue.clone()),
        config,
    );

    run_etl_worker(&queue, services.etl()).await?;
    tracing::info!("ETL worker stopped");
    Ok(())
}

async fn popularity(config: &Config) -> AppResult<()> {
    let database = connect_database(config).await?;
    let service = PopularityManager::new(persistence(&database));

    let report = service.recalculate().await?;
    println!(
        "Popularity recalculated for {} activities (max score {:.2})",
        report.updated, report.max_score
    );
    Ok(())
}
