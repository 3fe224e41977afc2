use crate::domain::model::{DataSummary, ServiceKind, ServiceStatus};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A backing service of the development stack.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> ServiceKind;

    /// Liveness probe; never fails, an unreachable service yields an unhealthy status.
    async fn check_connection(&self) -> ServiceStatus;

    async fn data_summary(&self) -> Result<DataSummary>;
}

/// Writes the fixture data set of one service. Returns the number of items written.
#[async_trait]
pub trait Seeder: Send + Sync {
    fn target(&self) -> ServiceKind;

    async fn seed(&self) -> Result<usize>;
}
