pub mod analysis;
pub mod assistant;
pub mod checks;
#[cfg(feature = "cli")]
pub mod diagnosis;
pub mod endpoints;
pub mod query;
pub mod seed;
pub mod status;

pub use crate::domain::model::{DataSummary, ServiceKind, ServiceStatus};
pub use crate::domain::ports::{Backend, Seeder};
pub use crate::utils::error::Result;
