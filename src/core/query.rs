//! Parsing and guarding of user-supplied queries before they reach a service.

use crate::utils::error::{DevStackError, Result};
use crate::utils::validation;
use serde_json::{json, Value};

pub const SUPPORTED_REDIS_COMMANDS: &[&str] = &["KEYS", "GET", "HGETALL", "SMEMBERS", "LRANGE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisCommand {
    Keys(String),
    Get(String),
    HGetAll(String),
    SMembers(String),
    LRange { key: String, start: isize, stop: isize },
}

/// Parses one of the read-only Redis commands; the verb is case-insensitive.
pub fn parse_redis_command(input: &str) -> Result<RedisCommand> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some((verb, args)) = parts.split_first() else {
        return Err(DevStackError::QueryRejected {
            reason: "empty Redis command".to_string(),
        });
    };

    let key_arg = |name: &str| -> Result<String> {
        args.first()
            .map(|k| k.to_string())
            .ok_or_else(|| DevStackError::QueryRejected {
                reason: format!("{} requires a key", name),
            })
    };

    match verb.to_ascii_uppercase().as_str() {
        "KEYS" => Ok(RedisCommand::Keys(
            args.first().copied().unwrap_or("*").to_string(),
        )),
        "GET" => Ok(RedisCommand::Get(key_arg("GET")?)),
        "HGETALL" => Ok(RedisCommand::HGetAll(key_arg("HGETALL")?)),
        "SMEMBERS" => Ok(RedisCommand::SMembers(key_arg("SMEMBERS")?)),
        "LRANGE" => {
            let [key, start, stop] = args else {
                return Err(DevStackError::QueryRejected {
                    reason: "usage: LRANGE key start stop".to_string(),
                });
            };
            let index = |v: &str| {
                v.parse::<isize>().map_err(|_| DevStackError::QueryRejected {
                    reason: format!("LRANGE index '{}' is not an integer", v),
                })
            };
            Ok(RedisCommand::LRange {
                key: key.to_string(),
                start: index(*start)?,
                stop: index(*stop)?,
            })
        }
        other => Err(DevStackError::UnsupportedCommand {
            command: format!(
                "{} (supported: {})",
                other,
                SUPPORTED_REDIS_COMMANDS.join(", ")
            ),
        }),
    }
}

/// Accepts a single SELECT statement and returns it without the trailing `;`.
pub fn guard_select(sql: &str) -> Result<String> {
    let trimmed = sql.trim();
    let statement = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();

    let first_word = statement
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    if first_word != "SELECT" {
        return Err(DevStackError::QueryRejected {
            reason: "only SELECT statements are allowed".to_string(),
        });
    }
    if statement.contains(';') {
        return Err(DevStackError::QueryRejected {
            reason: "multiple statements are not allowed".to_string(),
        });
    }
    Ok(statement.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    All,
    Title,
    Content,
    Category,
    Author,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::All => "all",
            SearchField::Title => "title",
            SearchField::Content => "content",
            SearchField::Category => "category",
            SearchField::Author => "author",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleQuery {
    pub term: String,
    pub field: SearchField,
}

impl ArticleQuery {
    pub fn new(term: impl Into<String>, field: SearchField) -> Result<Self> {
        let term = term.into();
        validation::validate_non_empty_string("term", &term)?;
        Ok(Self { term, field })
    }

    /// Elasticsearch request body: multi_match over all fields (title boosted) or a field match.
    pub fn to_request_body(&self) -> Value {
        match self.field {
            SearchField::All => json!({
                "query": {
                    "multi_match": {
                        "query": self.term,
                        "fields": ["title^2", "content", "category", "author"]
                    }
                },
                "highlight": {
                    "fields": { "title": {}, "content": {} }
                }
            }),
            field => {
                let name = field.as_str().to_string();
                let mut matcher = serde_json::Map::new();
                matcher.insert(name.clone(), json!(self.term));
                let mut highlighted = serde_json::Map::new();
                highlighted.insert(name, json!({}));
                json!({
                    "query": { "match": matcher },
                    "highlight": { "fields": highlighted }
                })
            }
        }
    }
}

pub const MAX_PRODUCT_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: u64,
    pub max_price: u64,
    pub limit: usize,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            min_price: 0,
            max_price: 100_000,
            limit: 5,
        }
    }
}

impl ProductFilter {
    pub fn validate(&self) -> Result<()> {
        validation::validate_range("limit", self.limit, 1, MAX_PRODUCT_LIMIT)?;
        if self.min_price > self.max_price {
            return Err(DevStackError::QueryRejected {
                reason: format!(
                    "min price {} is above max price {}",
                    self.min_price, self.max_price
                ),
            });
        }
        Ok(())
    }

    /// Qdrant `filter` object with a `must` clause per condition.
    pub fn to_filter(&self) -> Value {
        let mut must = Vec::new();
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            must.push(json!({ "key": "category", "match": { "value": category } }));
        }
        must.push(json!({ "key": "price", "range": { "gte": self.min_price } }));
        must.push(json!({ "key": "price", "range": { "lte": self.max_price } }));
        json!({ "must": must })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_redis_commands() {
        assert_eq!(parse_redis_command("keys").unwrap(), RedisCommand::Keys("*".to_string()));
        assert_eq!(
            parse_redis_command("KEYS session:*").unwrap(),
            RedisCommand::Keys("session:*".to_string())
        );
        assert_eq!(
            parse_redis_command("hgetall session:user1").unwrap(),
            RedisCommand::HGetAll("session:user1".to_string())
        );
        assert_eq!(
            parse_redis_command("LRANGE search:recent 0 -1").unwrap(),
            RedisCommand::LRange {
                key: "search:recent".to_string(),
                start: 0,
                stop: -1
            }
        );
    }

    #[test]
    fn test_redis_command_errors() {
        assert!(matches!(
            parse_redis_command("FLUSHALL"),
            Err(DevStackError::UnsupportedCommand { .. })
        ));
        assert!(matches!(
            parse_redis_command("GET"),
            Err(DevStackError::QueryRejected { .. })
        ));
        assert!(matches!(
            parse_redis_command("LRANGE search:recent 0"),
            Err(DevStackError::QueryRejected { .. })
        ));
        assert!(matches!(
            parse_redis_command("LRANGE search:recent a b"),
            Err(DevStackError::QueryRejected { .. })
        ));
        assert!(parse_redis_command("   ").is_err());
    }

    #[test]
    fn test_guard_select() {
        assert_eq!(
            guard_select("  select * from customers;  ").unwrap(),
            "select * from customers"
        );
        assert!(guard_select("DELETE FROM customers").is_err());
        assert!(guard_select("SELECT 1; DROP TABLE customers").is_err());
        assert!(guard_select("SELECTED").is_err());
        assert!(guard_select("").is_err());
    }

    #[test]
    fn test_article_query_bodies() {
        let all = ArticleQuery::new("Python", SearchField::All).unwrap().to_request_body();
        assert_eq!(all["query"]["multi_match"]["fields"][0], "title^2");
        assert!(all["highlight"]["fields"].get("content").is_some());

        let author = ArticleQuery::new("山田太郎", SearchField::Author).unwrap().to_request_body();
        assert_eq!(author["query"]["match"]["author"], "山田太郎");
        assert!(author["highlight"]["fields"].get("author").is_some());

        assert!(ArticleQuery::new(" ", SearchField::All).is_err());
    }

    #[test]
    fn test_product_filter() {
        let filter = ProductFilter {
            category: Some("スポーツ".to_string()),
            min_price: 1000,
            max_price: 20000,
            limit: 3,
        };
        filter.validate().unwrap();
        let body = filter.to_filter();
        let must = body["must"].as_array().unwrap();
        assert_eq!(must.len(), 3);
        assert_eq!(must[0]["match"]["value"], "スポーツ");
        assert_eq!(must[1]["range"]["gte"], 1000);
        assert_eq!(must[2]["range"]["lte"], 20000);

        assert_eq!(ProductFilter::default().to_filter()["must"].as_array().unwrap().len(), 2);
        assert!(ProductFilter { limit: 21, ..Default::default() }.validate().is_err());
        assert!(ProductFilter { min_price: 5, max_price: 1, ..Default::default() }.validate().is_err());
    }
}
