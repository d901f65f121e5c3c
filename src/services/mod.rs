//! Application services layer - use cases over the domain and the stores.
//!
//! Each service is a trait (mocked in tests) with a generic `*Manager`
//! implementation that reaches the repositories through a `UnitOfWork`.

mod activity_service;
mod auth_service;
pub mod container;
mod etl_service;
mod favorite_service;
mod popularity_service;
mod profile_service;
mod recommendation_service;

pub use container::{parallel, ServiceContainer, Services};

pub use activity_service::{ActivityManager, ActivityService, ImportResult, ImportRowError};
pub use auth_service::{AuthService, AuthUser, Claims, JwtVerifier};
pub use etl_service::{EtlManager, EtlService, EtlUpload};
pub use favorite_service::{FavoriteEntry, FavoriteManager, FavoriteService};
pub use popularity_service::{PopularityManager, PopularityReport, PopularityService};
pub use profile_service::{ProfileManager, ProfileService, ProfileView, UpdateProfileRequest};
pub use recommendation_service::{
    cache_key, user_cache_pattern, RecommendationEngine, RecommendationService,
};

#[cfg(any(test, feature = "test-utils"))]
pub use activity_service::MockActivityService;
#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::{issue_test_token, MockAuthService};
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use etl_service::MockEtlService;
#[cfg(any(test, feature = "test-utils"))]
pub use favorite_service::MockFavoriteService;
#[cfg(any(test, feature = "test-utils"))]
pub use popularity_service::MockPopularityService;
#[cfg(any(test, feature = "test-utils"))]
pub use profile_service::MockProfileService;
#[cfg(any(test, feature = "test-utils"))]
pub use recommendation_service::MockRecommendationService;
