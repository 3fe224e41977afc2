use crate::adapters::http::{build_client, ensure_success};
use crate::core::query::ProductFilter;
use crate::domain::fixtures::{self, PRODUCT_COLLECTION, VECTOR_SIZE};
use crate::domain::model::{DataSummary, Product, ProductMatch, ServiceKind, ServiceStatus};
use crate::domain::ports::{Backend, Seeder};
use crate::utils::error::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const SERVICE: &str = "Qdrant";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    points: Vec<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    id: Value,
    #[serde(default)]
    score: Option<f64>,
    payload: Option<Product>,
}

impl RawPoint {
    fn into_match(self) -> Option<ProductMatch> {
        let id = self.id.as_u64()?;
        Some(ProductMatch {
            id,
            product: self.payload?,
            score: self.score,
        })
    }
}

pub struct QdrantBackend {
    client: Client,
    base_url: String,
    health_path: String,
}

impl QdrantBackend {
    pub fn new(base_url: &str, health_path: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            health_path: health_path.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Products matching the payload filter, without similarity ranking.
    pub async fn filter_products(&self, filter: &ProductFilter) -> Result<Vec<ProductMatch>> {
        filter.validate()?;
        let request = json!({
            "filter": filter.to_filter(),
            "limit": filter.limit,
            "with_payload": true,
            "with_vector": false
        });
        let response = self
            .client
            .post(self.url(&format!("/collections/{}/points/scroll", PRODUCT_COLLECTION)))
            .json(&request)
            .send()
            .await?;
        let body: Envelope<ScrollResult> = ensure_success(SERVICE, response).await?.json().await?;
        Ok(body
            .result
            .points
            .into_iter()
            .filter_map(RawPoint::into_match)
            .collect())
    }

    /// Products closest to the vector of `product_id`, ranked by score.
    pub async fn similar_products(
        &self,
        product_id: u64,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductMatch>> {
        filter.validate()?;
        let request = json!({
            "positive": [product_id],
            "filter": filter.to_filter(),
            "limit": filter.limit,
            "with_payload": true
        });
        let response = self
            .client
            .post(self.url(&format!("/collections/{}/points/recommend", PRODUCT_COLLECTION)))
            .json(&request)
            .send()
            .await?;
        let body: Envelope<Vec<RawPoint>> = ensure_success(SERVICE, response).await?.json().await?;
        Ok(body
            .result
            .into_iter()
            .filter_map(RawPoint::into_match)
            .collect())
    }
}

/// Reproducible stand-in embedding for a product.
pub fn fixture_vector(product_id: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(product_id);
    (0..VECTOR_SIZE).map(|_| rng.gen::<f32>()).collect()
}

#[async_trait]
impl Backend for QdrantBackend {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Qdrant
    }

    async fn check_connection(&self) -> ServiceStatus {
        let started = Instant::now();
        match self.client.get(self.url(&self.health_path)).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                ServiceStatus::healthy(self.kind(), started.elapsed().as_millis())
            }
            Ok(response) => ServiceStatus::unhealthy(
                self.kind(),
                format!("Status: {}", response.status().as_u16()),
                started.elapsed().as_millis(),
            ),
            Err(e) => {
                ServiceStatus::unhealthy(self.kind(), e.to_string(), started.elapsed().as_millis())
            }
        }
    }

    async fn data_summary(&self) -> Result<DataSummary> {
        let response = self.client.get(self.url("/collections")).send().await?;
        let body: Envelope<CollectionList> = ensure_success(SERVICE, response).await?.json().await?;
        let names: Vec<String> = body.result.collections.into_iter().map(|c| c.name).collect();
        Ok(DataSummary::new(self.kind())
            .with("collection_count", names.len())
            .with("collections", names.join(", ")))
    }
}

#[async_trait]
impl Seeder for QdrantBackend {
    fn target(&self) -> ServiceKind {
        ServiceKind::Qdrant
    }

    async fn seed(&self) -> Result<usize> {
        let collection_url = self.url(&format!("/collections/{}", PRODUCT_COLLECTION));

        match self.client.delete(&collection_url).send().await {
            Ok(response) => tracing::debug!("Dropped {}: {}", PRODUCT_COLLECTION, response.status()),
            Err(e) => tracing::debug!("Dropping {} failed, continuing: {}", PRODUCT_COLLECTION, e),
        }

        let response = self
            .client
            .put(&collection_url)
            .json(&json!({
                "vectors": { "size": VECTOR_SIZE, "distance": "Cosine" }
            }))
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;

        let points: Vec<Value> = fixtures::products()
            .into_iter()
            .map(|(id, product)| {
                json!({
                    "id": id,
                    "vector": fixture_vector(id),
                    "payload": product
                })
            })
            .collect();
        let count = points.len();

        let response = self
            .client
            .put(format!("{}/points?wait=true", collection_url))
            .json(&json!({ "points": points }))
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;

        tracing::info!("Upserted {} points into {}", count, PRODUCT_COLLECTION);
        Ok(count)
    }
}
