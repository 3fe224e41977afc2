// Adapters layer: one client per backing service plus the shared HTTP helpers.

pub mod elastic_backend;
pub mod http;
pub mod openai;
pub mod postgres_backend;
pub mod qdrant_backend;
pub mod redis_backend;

use crate::config::StackConfig;
use crate::domain::ports::{Backend, Seeder};
use crate::utils::error::Result;
use std::sync::Arc;

pub use elastic_backend::ElasticBackend;
pub use openai::OpenAiClient;
pub use postgres_backend::PostgresBackend;
pub use qdrant_backend::QdrantBackend;
pub use redis_backend::RedisBackend;

/// The four service clients built from one configuration.
#[derive(Clone)]
pub struct Backends {
    pub redis: Arc<RedisBackend>,
    pub postgres: Arc<PostgresBackend>,
    pub elastic: Arc<ElasticBackend>,
    pub qdrant: Arc<QdrantBackend>,
}

impl Backends {
    pub fn from_config(config: &StackConfig) -> Result<Self> {
        let timeout = config.probe_timeout();
        Ok(Self {
            redis: Arc::new(RedisBackend::new(&config.redis, timeout)?),
            postgres: Arc::new(PostgresBackend::new(&config.postgres_url, timeout)?),
            elastic: Arc::new(ElasticBackend::new(&config.elastic_url, timeout)?),
            qdrant: Arc::new(QdrantBackend::new(
                &config.qdrant_url,
                &config.qdrant_health_path,
                timeout,
            )?),
        })
    }

    /// Backends in display order: Redis, PostgreSQL, Elasticsearch, Qdrant.
    pub fn all(&self) -> Vec<Arc<dyn Backend>> {
        vec![
            self.redis.clone(),
            self.postgres.clone(),
            self.elastic.clone(),
            self.qdrant.clone(),
        ]
    }

    pub fn seeders(&self) -> Vec<Arc<dyn Seeder>> {
        vec![
            self.redis.clone(),
            self.postgres.clone(),
            self.elastic.clone(),
            self.qdrant.clone(),
        ]
    }
}
