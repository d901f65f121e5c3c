//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod activity;
pub mod etl_execution;
pub mod favorite;
pub mod user_profile;

