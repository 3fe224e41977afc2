pub mod error;
pub mod logger;
pub mod monitor;
pub mod table;
pub mod validation;
