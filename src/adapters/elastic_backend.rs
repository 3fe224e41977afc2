use crate::adapters::http::{build_client, ensure_success};
use crate::core::query::ArticleQuery;
use crate::domain::fixtures::{self, ARTICLE_INDEX};
use crate::domain::model::{Article, DataSummary, SearchHit, ServiceKind, ServiceStatus};
use crate::domain::ports::{Backend, Seeder};
use crate::utils::error::{DevStackError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

const SERVICE: &str = "Elasticsearch";

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: Article,
    #[serde(default)]
    highlight: BTreeMap<String, Vec<String>>,
}

pub struct ElasticBackend {
    client: Client,
    base_url: String,
}

impl ElasticBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn search_articles(&self, query: &ArticleQuery) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .post(self.url(&format!("/{}/_search", ARTICLE_INDEX)))
            .json(&query.to_request_body())
            .send()
            .await?;
        let body: SearchResponse = ensure_success(SERVICE, response).await?.json().await?;

        Ok(body
            .hits
            .hits
            .into_iter()
            .map(|hit| SearchHit {
                id: hit.id,
                score: hit.score.unwrap_or(0.0),
                article: hit.source,
                highlights: hit
                    .highlight
                    .into_iter()
                    .flat_map(|(field, fragments)| {
                        fragments.into_iter().map(move |f| (field.clone(), f))
                    })
                    .collect(),
            })
            .collect())
    }

    async fn create_index(&self) -> Result<()> {
        let mapping = json!({
            "mappings": {
                "properties": {
                    "title": {"type": "text", "analyzer": "standard"},
                    "content": {"type": "text", "analyzer": "standard"},
                    "category": {"type": "keyword"},
                    "author": {"type": "keyword"},
                    "published_date": {"type": "date"},
                    "tags": {"type": "keyword"},
                    "view_count": {"type": "integer"}
                }
            }
        });
        let response = self
            .client
            .put(self.url(&format!("/{}", ARTICLE_INDEX)))
            .json(&mapping)
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            if body["error"]["type"] == "resource_already_exists_exception" {
                tracing::debug!("Index {} already exists", ARTICLE_INDEX);
                return Ok(());
            }
            return Err(DevStackError::UpstreamError {
                service: SERVICE.to_string(),
                status: StatusCode::BAD_REQUEST.as_u16(),
                body: body.to_string(),
            });
        }
        ensure_success(SERVICE, response).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for ElasticBackend {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Elasticsearch
    }

    async fn check_connection(&self) -> ServiceStatus {
        let started = Instant::now();
        match self.client.get(self.url("/_cluster/health")).send().await {
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
        let response = self
            .client
            .get(self.url(&format!("/{}/_count", ARTICLE_INDEX)))
            .send()
            .await?;
        let body: CountResponse = ensure_success(SERVICE, response).await?.json().await?;
        Ok(DataSummary::new(self.kind()).with("document_count", body.count))
    }
}

#[async_trait]
impl Seeder for ElasticBackend {
    fn target(&self) -> ServiceKind {
        ServiceKind::Elasticsearch
    }

    async fn seed(&self) -> Result<usize> {
        self.create_index().await?;

        let articles = fixtures::articles();
        for (i, article) in articles.iter().enumerate() {
            let response = self
                .client
                .put(self.url(&format!("/{}/_doc/{}", ARTICLE_INDEX, i + 1)))
                .json(article)
                .send()
                .await?;
            ensure_success(SERVICE, response).await?;
        }

        let response = self
            .client
            .post(self.url(&format!("/{}/_refresh", ARTICLE_INDEX)))
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;

        tracing::info!("Indexed {} articles into {}", articles.len(), ARTICLE_INDEX);
        Ok(articles.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::SearchField;
    use httpmock::prelude::*;

    fn backend(server: &MockServer) -> ElasticBackend {
        ElasticBackend::new(&server.base_url(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_health_check_requires_200() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/_cluster/health");
            then.status(503);
        });

        let status = backend(&server).check_connection().await;
        mock.assert();
        assert!(!status.healthy);
        assert_eq!(status.details, "Status: 503");
    }

    #[tokio::test]
    async fn test_search_parses_hits_and_highlights() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/blog_articles/_search")
                .json_body_partial(r#"{"query":{"match":{"title":"Docker"}}}"#);
            then.status(200).json_body(serde_json::json!({
                "hits": {"hits": [{
                    "_id": "2",
                    "_score": 1.5,
                    "_source": {
                        "title": "Dockerコンテナ活用術",
                        "content": "Docker Compose",
                        "category": "技術",
                        "author": "鈴木花子",
                        "published_date": "2024-01-12",
                        "tags": ["Docker"],
                        "view_count": 980
                    },
                    "highlight": {"title": ["<em>Docker</em>コンテナ活用術"]}
                }]}
            }));
        });

        let query = ArticleQuery::new("Docker", SearchField::Title).unwrap();
        let hits = backend(&server).search_articles(&query).await.unwrap();
        mock.assert();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");
        assert_eq!(hits[0].article.view_count, 980);
        assert_eq!(hits[0].highlights[0].0, "title");
    }

    #[tokio::test]
    async fn test_seed_tolerates_existing_index() {
        let server = MockServer::start();
        let index = server.mock(|when, then| {
            when.method(PUT).path("/blog_articles");
            then.status(400).json_body(serde_json::json!({
                "error": {"type": "resource_already_exists_exception"}
            }));
        });
        let docs = server.mock(|when, then| {
            when.method(PUT).path_matches(regex::Regex::new(r"^/blog_articles/_doc/\d+$").unwrap());
            then.status(201).json_body(serde_json::json!({"result": "created"}));
        });
        let refresh = server.mock(|when, then| {
            when.method(POST).path("/blog_articles/_refresh");
            then.status(200).json_body(serde_json::json!({}));
        });

        let written = backend(&server).seed().await.unwrap();
        index.assert();
        docs.assert_hits(5);
        refresh.assert();
        assert_eq!(written, 5);
    }

    #[tokio::test]
    async fn test_seed_stops_on_rejected_document() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PUT).path("/blog_articles");
            then.status(200).json_body(serde_json::json!({"acknowledged": true}));
        });
        let docs = server.mock(|when, then| {
            when.method(PUT).path_matches(regex::Regex::new(r"^/blog_articles/_doc/\d+$").unwrap());
            then.status(500).body("cluster_block_exception");
        });
        let refresh = server.mock(|when, then| {
            when.method(POST).path("/blog_articles/_refresh");
            then.status(200).json_body(serde_json::json!({}));
        });

        let err = backend(&server).seed().await.unwrap_err();
        assert!(matches!(err, DevStackError::UpstreamError { status: 500, .. }));
        docs.assert_hits(1);
        refresh.assert_hits(0);
    }

    #[tokio::test]
    async fn test_summary_reports_upstream_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/blog_articles/_count");
            then.status(404).body("index_not_found_exception");
        });

        let err = backend(&server).data_summary().await.unwrap_err();
        assert!(matches!(err, DevStackError::UpstreamError { status: 404, .. }));
    }
}
