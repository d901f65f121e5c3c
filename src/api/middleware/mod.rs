//! API middleware.

mod auth;

pub use auth::{admin_middleware, auth_middleware, optional_auth_middleware};
