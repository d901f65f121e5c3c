//! Background jobs.
//!
//! ETL batches go through an apalis Postgres queue so the HTTP request that
//! uploads a file returns as soon as the job is stored. Popularity runs on a
//! cron schedule inside the server process.

mod etl_job;
mod popularity_job;

pub use etl_job::{etl_job_handler, run_etl_worker, ApalisEtlQueue, EtlDispatcher, EtlJob, NoQueue};
pub use popularity_job::start_popularity_schedule;

#[cfg(any(test, feature = "test-utils"))]
pub use etl_job::MockEtlDispatcher;
