//! Command-line interface: `serve`, `migrate`, `jobs` and `etl`.

pub mod args;

pub use args::{Cli, Commands};
