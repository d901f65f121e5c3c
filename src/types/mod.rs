//! Shared request and response types.

mod pagination;
mod response;

pub use pagination::{
    Paginated, PaginatedActivities, PaginatedExecutions, PaginatedFavorites, PaginatedSummaries,
    PaginationMeta,
    PaginationParams,
};
pub use response::{Accepted, Created, NoContent};
