//! Infrastructure layer - External systems integration
//!
//! - Database connection, migrations and repositories
//! - Caching (Redis, or in-process when no Redis is configured)
//! - Unit of Work handing repositories to the services

pub mod cache;
pub mod db;
pub mod local_cache;
pub mod repositories;
pub mod unit_of_work;

pub use cache::{Cache, CacheStore};
pub use db::{Database, Migrator};
pub use local_cache::LocalCache;
pub use repositories::{
    ActivityFilter, ActivityRepository, ActivityStore, EtlExecutionRepository, EtlExecutionStore,
    FavoriteRepository, FavoriteStore, InsertOutcome, ProfileRepository, ProfileStore,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockCacheStore;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockActivityRepository, MockEtlExecutionRepository, MockFavoriteRepository,
    MockProfileRepository,
};
