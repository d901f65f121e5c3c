//! Cache stores.
//!
//! `CacheStore` is the seam the services use: string values with a TTL and
//! pattern deletion. `Cache` is the Redis implementation; `LocalCache` in
//! `local_cache` is the in-process one.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::CACHE_SCAN_BATCH;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Key-value store with TTL and glob-pattern deletion.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>>;

    async fn set_raw(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()>;

    /// Delete every key matching a glob pattern, returning how many went away.
    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64>;

    async fn ping(&self) -> AppResult<()>;
}

/// Read and deserialize a JSON value.
pub async fn get_json<T: DeserializeOwned>(store: &dyn CacheStore, key: &str) -> AppResult<Option<T>> {
    match store.get_raw(key).await? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| AppError::Cache(format!("Cache deserialization error: {}", e))),
        None => Ok(None),
    }
}

/// Serialize and store a JSON value.
pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl_seconds: u64,
) -> AppResult<()> {
    let json = serde_json::to_string(value)
        .map_err(|e| AppError::Cache(format!("Cache serialization error: {}", e)))?;
    store.set_raw(key, json, ttl_seconds).await
}

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    pub async fn connect(redis_url: &str) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        tracing::info!("Redis cache connected");
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for Cache {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        conn.get(key).await.map_err(cache_error)
    }

    async fn set_raw(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(cache_error)
    }

    /// SCAN in batches so a large keyspace never blocks the server.
    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        let mut conn = self.connection.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(CACHE_SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(cache_error)?;

            if !keys.is_empty() {
                let removed: u64 = conn.del(&keys).await.map_err(cache_error)?;
                deleted += removed;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!(pattern = %pattern, deleted, "Cache keys invalidated");
        Ok(deleted)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }
}

/// Callers decide how loudly a cache failure is reported, so nothing is
/// logged here.
fn cache_error(e: RedisError) -> AppError {
    AppError::Cache(format!("Redis error: {}", e))
}
