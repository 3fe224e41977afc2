use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Redis,
    Postgres,
    Elasticsearch,
    Qdrant,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Redis,
        ServiceKind::Postgres,
        ServiceKind::Elasticsearch,
        ServiceKind::Qdrant,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::Redis => "Redis",
            ServiceKind::Postgres => "PostgreSQL",
            ServiceKind::Elasticsearch => "Elasticsearch",
            ServiceKind::Qdrant => "Qdrant",
        }
    }

    /// Container port the service listens on.
    pub fn default_port(&self) -> u16 {
        match self {
            ServiceKind::Redis => 6379,
            ServiceKind::Postgres => 5432,
            ServiceKind::Elasticsearch => 9200,
            ServiceKind::Qdrant => 6333,
        }
    }

    /// Matches a manifest image reference such as `redis:7-alpine` to a service.
    pub fn from_image(image: &str) -> Option<Self> {
        let name = image
            .rsplit('/')
            .next()
            .unwrap_or(image)
            .split([':', '@'])
            .next()
            .unwrap_or_default();
        match name {
            "redis" | "redis-stack-server" | "redis-stack" => Some(ServiceKind::Redis),
            "postgres" | "postgis" => Some(ServiceKind::Postgres),
            "elasticsearch" => Some(ServiceKind::Elasticsearch),
            "qdrant" => Some(ServiceKind::Qdrant),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(ServiceKind::Redis),
            "postgres" | "postgresql" | "pg" => Ok(ServiceKind::Postgres),
            "elasticsearch" | "elastic" | "es" => Ok(ServiceKind::Elasticsearch),
            "qdrant" => Ok(ServiceKind::Qdrant),
            other => Err(format!("unknown service: {}", other)),
        }
    }
}

pub const STATUS_DETAIL_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub service: ServiceKind,
    pub healthy: bool,
    pub details: String,
    pub latency_ms: u128,
}

impl ServiceStatus {
    pub fn healthy(service: ServiceKind, latency_ms: u128) -> Self {
        Self {
            service,
            healthy: true,
            details: "OK".to_string(),
            latency_ms,
        }
    }

    pub fn unhealthy(service: ServiceKind, details: impl Into<String>, latency_ms: u128) -> Self {
        Self {
            service,
            healthy: false,
            details: truncate_chars(&details.into(), STATUS_DETAIL_LIMIT),
            latency_ms,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.healthy {
            "🟢 connected"
        } else {
            "🔴 unreachable"
        }
    }
}

pub fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}

/// Key figures for one backend; `complete` is false when a count was capped or failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub service: ServiceKind,
    pub complete: bool,
    pub metrics: BTreeMap<String, String>,
}

impl DataSummary {
    pub fn new(service: ServiceKind) -> Self {
        Self {
            service,
            complete: true,
            metrics: BTreeMap::new(),
        }
    }

    pub fn unavailable(service: ServiceKind, reason: impl Into<String>) -> Self {
        let mut summary = Self::new(service);
        summary.complete = false;
        summary.metrics.insert("error".to_string(), reason.into());
        summary
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.metrics.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub category: String,
    pub author: String,
    pub published_date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub view_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub article: Article,
    pub highlights: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductMatch {
    pub id: u64,
    pub product: Product,
    pub score: Option<f64>,
}

/// Output of a whitelisted Redis command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RedisValue {
    Nil,
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RedisDetails {
    pub sessions: Vec<BTreeMap<String, String>>,
    pub counters: BTreeMap<String, String>,
    pub categories: Vec<String>,
    pub search_history: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RedisStats {
    pub active_sessions: u64,
    pub page_views: u64,
    pub recent_searches: u64,
    pub used_memory: String,
    pub connected_clients: u64,
    pub total_commands: u64,
    pub uptime_days: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_wire_format() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_service_from_image() {
        assert_eq!(ServiceKind::from_image("redis:7-alpine"), Some(ServiceKind::Redis));
        assert_eq!(ServiceKind::from_image("postgres:16"), Some(ServiceKind::Postgres));
        assert_eq!(
            ServiceKind::from_image("docker.elastic.co/elasticsearch/elasticsearch:8.11.0"),
            Some(ServiceKind::Elasticsearch)
        );
        assert_eq!(ServiceKind::from_image("qdrant/qdrant:latest"), Some(ServiceKind::Qdrant));
        assert_eq!(ServiceKind::from_image("nginx"), None);
    }

    #[test]
    fn test_unhealthy_details_are_truncated() {
        let status = ServiceStatus::unhealthy(ServiceKind::Redis, "x".repeat(80), 3);
        assert_eq!(status.details.chars().count(), STATUS_DETAIL_LIMIT);
        assert!(!status.healthy);
    }

    #[test]
    fn test_service_kind_parse() {
        assert_eq!("PG".parse::<ServiceKind>(), Ok(ServiceKind::Postgres));
        assert_eq!("es".parse::<ServiceKind>(), Ok(ServiceKind::Elasticsearch));
        assert!("mongo".parse::<ServiceKind>().is_err());
    }
}
