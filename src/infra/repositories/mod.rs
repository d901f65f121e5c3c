//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

mod activity_repository;
pub(crate) mod entities;
mod etl_execution_repository;
mod favorite_repository;
mod profile_repository;

pub use activity_repository::{ActivityFilter, ActivityRepository, ActivityStore, InsertOutcome};
pub use etl_execution_repository::{EtlExecutionRepository, EtlExecutionStore};
pub use favorite_repository::{FavoriteRepository, FavoriteStore};
pub use profile_repository::{ProfileRepository, ProfileStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use activity_repository::MockActivityRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use etl_execution_repository::MockEtlExecutionRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use favorite_repository::MockFavoriteRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use profile_repository::MockProfileRepository;
