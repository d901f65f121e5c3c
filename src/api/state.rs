//! Application state shared by every handler.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{CacheStore, Database, Persistence};
use crate::jobs::EtlDispatcher;
use crate::services::{ServiceContainer, Services};

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    pub cache: Arc<dyn CacheStore>,
    /// `None` when the router runs without a database, as in handler tests
    pub database: Option<Arc<Database>>,
}

impl AppState {
    /// Wire the services over the real database, cache and ETL queue.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<dyn CacheStore>,
        dispatcher: Arc<dyn EtlDispatcher>,
        config: &Config,
    ) -> Self {
        let uow = Arc::new(Persistence::new(database.get_connection()));
        let services = Services::build(uow, cache.clone(), dispatcher, config);

        Self {
            services: Arc::new(services),
            cache,
            database: Some(database),
        }
    }

    /// State over already-built services.
    pub fn new(services: Arc<dyn ServiceContainer>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            services,
            cache,
            database: None,
        }
    }
}
