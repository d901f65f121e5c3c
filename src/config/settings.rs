//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_POPULARITY_CRON, DEFAULT_REDIS_URL, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, MIN_JWT_SECRET_LENGTH, RECOMMENDATION_CACHE_TTL_SECONDS,
};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    /// Redis URL; `None` selects the in-process cache
    pub redis_url: Option<String>,
    jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    /// TTL applied to cached recommendation lists
    pub recommendation_cache_ttl: u64,
    /// Cron expression for the in-process popularity job; `None` disables it
    pub popularity_cron: Option<String>,
    /// Whether `serve` also runs the ETL queue worker
    pub etl_embedded_worker: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("recommendation_cache_ttl", &self.recommendation_cache_ttl)
            .field("popularity_cron", &self.popularity_cron)
            .field("etl_embedded_worker", &self.etl_embedded_worker)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is missing in production or shorter than the minimum.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if production {
                panic!("JWT_SECRET environment variable must be set in production");
            }
            tracing::warn!("JWT_SECRET not set, using insecure default for development");
            "dev-secret-key-minimum-32-chars!!".to_string()
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let popularity_cron = match env::var("POPULARITY_CRON") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value),
            Err(_) => Some(DEFAULT_POPULARITY_CRON.to_string()),
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: match env::var("REDIS_URL") {
                Ok(value) if value.trim().is_empty() => None,
                Ok(value) => Some(value),
                Err(_) => Some(DEFAULT_REDIS_URL.to_string()),
            },
            jwt_secret,
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            recommendation_cache_ttl: env::var("RECOMMENDATION_CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(RECOMMENDATION_CACHE_TTL_SECONDS),
            popularity_cron,
            etl_embedded_worker: env::var("ETL_EMBEDDED_WORKER")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    /// Get JWT secret bytes for token verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}
