//! Triqueta: cultural, sports and recreation activities in Bogotá.
//!
//! - **etl**: extract, clean, map, validate and deduplicate source records
//! - **domain**: activities, favorites, profiles, scoring rules
//! - **services**: use cases over the unit of work and the cache
//! - **infra**: Postgres via sea-orm, Redis or in-process cache
//! - **jobs**: apalis ETL queue and the popularity schedule
//! - **api**: axum routes, auth middleware, OpenAPI
//! - **cli** / **commands**: `serve`, `migrate`, `jobs`, `etl`
//!
//! ```bash
//! triqueta migrate up
//! triqueta serve
//! triqueta etl run --file eventos.csv
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod etl;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;

pub use api::{create_router, AppState};
pub use config::Config;
pub use domain::{Activity, ActivityStatus, NewActivity};
pub use errors::{AppError, AppResult};
