//! Domain layer - Core business entities and logic
//!
//! Catalog types, the ETL execution state machine, user preferences and the
//! scoring rules. No I/O lives here.

pub mod activity;
pub mod catalog;
pub mod etl_execution;
pub mod favorite;
pub mod popularity;
pub mod profile;
pub mod recommendation;
pub mod search;

pub use activity::{normalize_tags, Activity, ActivityUpdate, NewActivity};
pub use catalog::{ActivityLevel, ActivityStatus, Category, Locality};
pub use etl_execution::{truncate_chars, EtlExecution, EtlStatus};
pub use favorite::Favorite;
pub use popularity::PopularityInput;
pub use profile::UserProfile;
pub use recommendation::{
    Explanation, ReasonKind, Recommendation, RecommendationList, RecommendationQuery,
};
pub use search::{ActivitySearch, ActivitySummary, SortField, SortOrder};
