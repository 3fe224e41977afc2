pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::Backends;
pub use config::StackConfig;
pub use core::{seed::SeedEngine, status::StatusManager};
pub use utils::error::{DevStackError, Result};
