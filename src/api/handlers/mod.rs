//! HTTP request handlers.

pub mod activity_handler;
pub mod admin_handler;
pub mod etl_handler;
pub mod favorite_handler;
pub mod profile_handler;
pub mod recommendation_handler;

pub use activity_handler::activity_routes;
pub use admin_handler::admin_routes;
pub use etl_handler::etl_routes;
pub use favorite_handler::favorite_routes;
pub use profile_handler::profile_routes;
pub use recommendation_handler::recommendation_routes;
