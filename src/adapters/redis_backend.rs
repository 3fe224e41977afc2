use crate::config::RedisSettings;
use crate::core::query::RedisCommand;
use crate::domain::fixtures;
use crate::domain::model::{
    DataSummary, RedisDetails, RedisStats, RedisValue, ServiceKind, ServiceStatus,
};
use crate::domain::ports::{Backend, Seeder};
use crate::utils::error::{DevStackError, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Keys counted before the summary reports a partial figure.
pub const KEY_COUNT_LIMIT: usize = 1000;

pub struct RedisBackend {
    client: redis::Client,
    timeout: Duration,
}

impl RedisBackend {
    pub fn new(settings: &RedisSettings, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(settings.url())?;
        Ok(Self { client, timeout })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        tokio::time::timeout(self.timeout, self.client.get_multiplexed_async_connection())
            .await
            .map_err(|_| DevStackError::Timeout {
                operation: "connecting to Redis".to_string(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(DevStackError::from)
    }

    pub async fn execute(&self, command: &RedisCommand) -> Result<RedisValue> {
        let mut conn = self.connection().await?;
        tracing::debug!("Executing Redis command {:?}", command);
        let reply: redis::Value = redis_cmd(command).query_async(&mut conn).await?;
        reply_to_value(command, &reply)
    }

    /// Sessions, counters, categories and recent searches.
    pub async fn details(&self) -> Result<RedisDetails> {
        let mut conn = self.connection().await?;

        let mut session_keys = scan_keys(&mut conn, &format!("{}*", fixtures::SESSION_PREFIX)).await?;
        session_keys.sort();
        let mut sessions = Vec::with_capacity(session_keys.len());
        for key in session_keys {
            let mut data: BTreeMap<String, String> = conn.hgetall(&key).await?;
            data.insert("session_key".to_string(), key);
            sessions.push(data);
        }

        let counter_keys = scan_keys(&mut conn, &format!("{}*", fixtures::COUNTER_PREFIX)).await?;
        let mut counters = BTreeMap::new();
        for key in counter_keys {
            let value: Option<String> = conn.get(&key).await?;
            let name = key.trim_start_matches(fixtures::COUNTER_PREFIX).to_string();
            counters.insert(name, value.unwrap_or_default());
        }

        let mut categories: Vec<String> = conn.smembers(fixtures::CATEGORIES_KEY).await?;
        categories.sort();
        let search_history: Vec<String> = conn.lrange(fixtures::RECENT_SEARCH_KEY, 0, -1).await?;

        Ok(RedisDetails {
            sessions,
            counters,
            categories,
            search_history,
        })
    }

    pub async fn stats(&self) -> Result<RedisStats> {
        let mut conn = self.connection().await?;

        let active_sessions =
            count_keys(&mut conn, &format!("{}*", fixtures::SESSION_PREFIX), usize::MAX).await?;
        let page_views: Option<u64> = conn
            .get(format!("{}page_views", fixtures::COUNTER_PREFIX))
            .await?;
        let recent_searches: u64 = conn.llen(fixtures::RECENT_SEARCH_KEY).await?;
        let info_text: String = redis::cmd("INFO").query_async(&mut conn).await?;
        let info = parse_info(&info_text);
        let number = |key: &str| {
            info.get(key)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
        };

        Ok(RedisStats {
            active_sessions: active_sessions.count as u64,
            page_views: page_views.unwrap_or(0),
            recent_searches,
            used_memory: info
                .get("used_memory_human")
                .cloned()
                .unwrap_or_else(|| "N/A".to_string()),
            connected_clients: number("connected_clients"),
            total_commands: number("total_commands_processed"),
            uptime_days: number("uptime_in_days"),
        })
    }
}

#[async_trait]
impl Backend for RedisBackend {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Redis
    }

    async fn check_connection(&self) -> ServiceStatus {
        let started = Instant::now();
        let result = async {
            let mut conn = self.connection().await?;
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, DevStackError>(pong)
        };
        match tokio::time::timeout(self.timeout, result).await {
            Ok(Ok(_)) => ServiceStatus::healthy(self.kind(), started.elapsed().as_millis()),
            Ok(Err(e)) => {
                ServiceStatus::unhealthy(self.kind(), e.to_string(), started.elapsed().as_millis())
            }
            Err(_) => ServiceStatus::unhealthy(self.kind(), "PING timed out", started.elapsed().as_millis()),
        }
    }

    async fn data_summary(&self) -> Result<DataSummary> {
        let mut conn = self.connection().await?;
        let keys = count_keys(&mut conn, "*", KEY_COUNT_LIMIT).await?;
        if keys.capped {
            return Ok(capped_summary());
        }

        let sessions =
            count_keys(&mut conn, &format!("{}*", fixtures::SESSION_PREFIX), usize::MAX).await?;
        let counters =
            count_keys(&mut conn, &format!("{}*", fixtures::COUNTER_PREFIX), usize::MAX).await?;

        Ok(DataSummary::new(self.kind())
            .with("key_count", keys.count)
            .with("session_count", sessions.count)
            .with("counter_count", counters.count))
    }
}

#[async_trait]
impl Seeder for RedisBackend {
    fn target(&self) -> ServiceKind {
        ServiceKind::Redis
    }

    async fn seed(&self) -> Result<usize> {
        let mut conn = self.connection().await?;
        let mut written = 0;

        for session in fixtures::SESSIONS {
            let fields = [
                ("user_id", session.user_id.to_string()),
                ("username", session.username.to_string()),
                ("login_time", session.login_time.to_string()),
            ];
            conn.hset_multiple::<_, _, _, ()>(session.key, &fields).await?;
            written += 1;
        }

        for (name, value) in fixtures::COUNTERS {
            conn.set::<_, _, ()>(format!("{}{}", fixtures::COUNTER_PREFIX, name), *value)
                .await?;
            written += 1;
        }

        conn.del::<_, ()>(fixtures::CATEGORIES_KEY).await?;
        conn.sadd::<_, _, ()>(fixtures::CATEGORIES_KEY, fixtures::CATEGORIES).await?;
        written += 1;

        // LPUSH one by one so the newest search ends up first
        conn.del::<_, ()>(fixtures::RECENT_SEARCH_KEY).await?;
        for term in fixtures::RECENT_SEARCHES {
            conn.lpush::<_, _, ()>(fixtures::RECENT_SEARCH_KEY, *term).await?;
        }
        written += 1;

        for (key, profile) in fixtures::user_profiles() {
            conn.set::<_, _, ()>(key, serde_json::to_string(&profile)?).await?;
            written += 1;
        }

        tracing::info!("Seeded {} Redis keys", written);
        Ok(written)
    }
}

async fn scan_keys(conn: &mut MultiplexedConnection, pattern: &str) -> Result<Vec<String>> {
    let mut iter = conn.scan_match::<_, String>(pattern).await?;
    let mut keys = Vec::new();
    while let Some(key) = iter.next_item().await {
        keys.push(key);
    }
    Ok(keys)
}

/// Keys seen while scanning, stopped at a limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyCount {
    pub count: usize,
    pub capped: bool,
}

impl KeyCount {
    /// Records one key; returns `false` once the limit has been passed.
    fn record(&mut self, limit: usize) -> bool {
        if self.count >= limit {
            self.capped = true;
            return false;
        }
        self.count += 1;
        true
    }
}

pub fn tally_keys<I: IntoIterator>(keys: I, limit: usize) -> KeyCount {
    let mut counted = KeyCount::default();
    for _ in keys {
        if !counted.record(limit) {
            break;
        }
    }
    counted
}

async fn count_keys(conn: &mut MultiplexedConnection, pattern: &str, limit: usize) -> Result<KeyCount> {
    let mut iter = conn.scan_match::<_, String>(pattern).await?;
    let mut counted = KeyCount::default();
    while iter.next_item().await.is_some() {
        if !counted.record(limit) {
            break;
        }
    }
    Ok(counted)
}

fn capped_summary() -> DataSummary {
    let mut summary =
        DataSummary::new(ServiceKind::Redis).with("key_count", format!("{}+", KEY_COUNT_LIMIT));
    summary.complete = false;
    summary
}

fn redis_cmd(command: &RedisCommand) -> redis::Cmd {
    match command {
        RedisCommand::Keys(pattern) => redis::cmd("KEYS").arg(pattern).clone(),
        RedisCommand::Get(key) => redis::cmd("GET").arg(key).clone(),
        RedisCommand::HGetAll(key) => redis::cmd("HGETALL").arg(key).clone(),
        RedisCommand::SMembers(key) => redis::cmd("SMEMBERS").arg(key).clone(),
        RedisCommand::LRange { key, start, stop } => {
            redis::cmd("LRANGE").arg(key).arg(*start).arg(*stop).clone()
        }
    }
}

/// Converts a raw reply; KEYS and SMEMBERS results are sorted.
fn reply_to_value(command: &RedisCommand, reply: &redis::Value) -> Result<RedisValue> {
    let value = match command {
        RedisCommand::Keys(_) | RedisCommand::SMembers(_) => {
            let mut items: Vec<String> = redis::from_redis_value(reply)?;
            items.sort();
            RedisValue::List(items)
        }
        RedisCommand::LRange { .. } => RedisValue::List(redis::from_redis_value(reply)?),
        RedisCommand::Get(_) => match redis::from_redis_value::<Option<String>>(reply)? {
            Some(value) => RedisValue::Text(value),
            None => RedisValue::Nil,
        },
        RedisCommand::HGetAll(_) => RedisValue::Map(redis::from_redis_value(reply)?),
    };
    Ok(value)
}

/// Parses the `key:value` lines of an INFO reply.
pub fn parse_info(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info() {
        let info = parse_info(
            "# Server\r\nredis_version:7.2.4\r\nuptime_in_days:3\r\n\r\n# Memory\r\nused_memory_human:1.02M\r\n",
        );
        assert_eq!(info.get("redis_version").map(String::as_str), Some("7.2.4"));
        assert_eq!(info.get("uptime_in_days").map(String::as_str), Some("3"));
        assert_eq!(info.get("used_memory_human").map(String::as_str), Some("1.02M"));
        assert!(!info.contains_key("# Server"));
    }

    fn unreachable() -> RedisBackend {
        let settings = RedisSettings {
            host: "127.0.0.1".to_string(),
            port: 1,
            db: 0,
        };
        RedisBackend::new(&settings, Duration::from_secs(1)).unwrap()
    }

    fn data(s: &str) -> redis::Value {
        redis::Value::Data(s.as_bytes().to_vec())
    }

    #[test]
    fn test_key_count_caps_past_limit() {
        assert_eq!(tally_keys(0..KEY_COUNT_LIMIT, KEY_COUNT_LIMIT), KeyCount { count: 1000, capped: false });
        assert_eq!(
            tally_keys(0..KEY_COUNT_LIMIT + 1, KEY_COUNT_LIMIT),
            KeyCount { count: 1000, capped: true }
        );
        assert_eq!(tally_keys(std::iter::repeat(()), 3), KeyCount { count: 3, capped: true });

        let summary = capped_summary();
        assert!(!summary.complete);
        assert_eq!(summary.metrics.get("key_count").map(String::as_str), Some("1000+"));
    }

    #[test]
    fn test_whitelisted_commands_pack_to_resp() {
        let packed = redis_cmd(&RedisCommand::Keys("user:*".to_string())).get_packed_command();
        assert_eq!(packed, b"*2\r\n$4\r\nKEYS\r\n$6\r\nuser:*\r\n".to_vec());

        let packed = redis_cmd(&RedisCommand::LRange {
            key: "search:recent".to_string(),
            start: 0,
            stop: -1,
        })
        .get_packed_command();
        let text = String::from_utf8(packed).unwrap();
        assert!(text.starts_with("*4\r\n$6\r\nLRANGE\r\n"));
        assert!(text.ends_with("$1\r\n0\r\n$2\r\n-1\r\n"));
    }

    #[test]
    fn test_set_and_key_replies_are_sorted() {
        let reply = redis::Value::Bulk(vec![data("session:3"), data("session:1"), data("session:2")]);
        assert_eq!(
            reply_to_value(&RedisCommand::Keys("session:*".to_string()), &reply).unwrap(),
            RedisValue::List(vec![
                "session:1".to_string(),
                "session:2".to_string(),
                "session:3".to_string()
            ])
        );
        let members = redis::Value::Bulk(vec![data("本"), data("スポーツ")]);
        let RedisValue::List(sorted) =
            reply_to_value(&RedisCommand::SMembers("categories".to_string()), &members).unwrap()
        else {
            panic!("expected a list");
        };
        let mut expected = vec!["本".to_string(), "スポーツ".to_string()];
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_list_hash_and_nil_replies() {
        let list = redis::Value::Bulk(vec![data("b"), data("a")]);
        let lrange = RedisCommand::LRange {
            key: "search:recent".to_string(),
            start: 0,
            stop: -1,
        };
        assert_eq!(
            reply_to_value(&lrange, &list).unwrap(),
            RedisValue::List(vec!["b".to_string(), "a".to_string()])
        );

        let hash = redis::Value::Bulk(vec![data("username"), data("tanaka")]);
        let RedisValue::Map(map) =
            reply_to_value(&RedisCommand::HGetAll("session:user:1001".to_string()), &hash).unwrap()
        else {
            panic!("expected a map");
        };
        assert_eq!(map.get("username").map(String::as_str), Some("tanaka"));

        assert_eq!(
            reply_to_value(&RedisCommand::Get("missing".to_string()), &redis::Value::Nil).unwrap(),
            RedisValue::Nil
        );
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_unhealthy() {
        let status = unreachable().check_connection().await;
        assert!(!status.healthy);
        assert_eq!(status.service, ServiceKind::Redis);
    }

    #[tokio::test]
    async fn test_seed_and_execute_fail_without_server() {
        let backend = unreachable();
        assert!(backend.seed().await.is_err());
        assert!(backend
            .execute(&RedisCommand::Keys("*".to_string()))
            .await
            .is_err());
    }
}
