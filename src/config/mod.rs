#[cfg(feature = "cli")]
pub mod cli;
pub mod manifest;
pub mod settings;

pub use settings::{RedisSettings, StackConfig};
