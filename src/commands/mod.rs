//! CLI command implementations, one module per subcommand.

pub mod etl;
pub mod jobs;
pub mod migrate;
pub mod serve;

use std::sync::Arc;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, CacheStore, Database, LocalCache, Persistence};

/// Connect to Postgres and apply pending migrations.
pub(crate) async fn connect_database(config: &Config) -> AppResult<Arc<Database>> {
    let database = Database::connect(config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    Ok(Arc::new(database))
}

/// Redis when configured and reachable, otherwise the in-process cache.
pub(crate) async fn connect_cache(config: &Config) -> Arc<dyn CacheStore> {
    let Some(url) = config.redis_url.as_deref() else {
        tracing::info!("REDIS_URL not set, using in-process cache");
        return Arc::new(LocalCache::new());
    };

    match Cache::connect(url).await {
        Ok(cache) => {
            tracing::info!("Redis cache connected");
            Arc::new(cache)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, falling back to in-process cache");
            Arc::new(LocalCache::new())
        }
    }
}

pub(crate) fn persistence(database: &Database) -> Arc<Persistence> {
    Arc::new(Persistence::new(database.get_connection()))
}
