//! Typed view of the service composition manifest (`docker-compose.mcp-demo.yml`).

use crate::utils::error::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ComposeFile {
    #[serde(default)]
    pub services: BTreeMap<String, ComposeService>,
    #[serde(default)]
    pub volumes: BTreeMap<String, Option<serde_yaml::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComposeService {
    pub image: Option<String>,
    pub build: Option<serde_yaml::Value>,
    #[serde(default)]
    pub ports: Vec<serde_yaml::Value>,
    #[serde(default)]
    pub volumes: Vec<serde_yaml::Value>,
    pub environment: Option<EnvironmentBlock>,
    pub healthcheck: Option<HealthCheck>,
    pub depends_on: Option<DependsOn>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentBlock {
    List(Vec<String>),
    Map(BTreeMap<String, Option<serde_yaml::Value>>),
}

impl EnvironmentBlock {
    /// Keys in declaration order, duplicates included.
    pub fn keys(&self) -> Vec<String> {
        match self {
            EnvironmentBlock::List(items) => items
                .iter()
                .map(|item| item.split('=').next().unwrap_or_default().trim().to_string())
                .collect(),
            EnvironmentBlock::Map(map) => map.keys().cloned().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            EnvironmentBlock::List(items) => items.iter().find_map(|item| {
                let (k, v) = item.split_once('=')?;
                (k.trim() == key).then(|| v.trim().to_string())
            }),
            EnvironmentBlock::Map(map) => map.get(key).map(|v| match v {
                Some(serde_yaml::Value::String(s)) => s.clone(),
                Some(serde_yaml::Value::Bool(b)) => b.to_string(),
                Some(serde_yaml::Value::Number(n)) => n.to_string(),
                _ => String::new(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    List(Vec<String>),
    Map(BTreeMap<String, serde_yaml::Value>),
}

impl DependsOn {
    pub fn services(&self) -> Vec<String> {
        match self {
            DependsOn::List(items) => items.clone(),
            DependsOn::Map(map) => map.keys().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthCheck {
    pub test: Option<serde_yaml::Value>,
    pub interval: Option<String>,
    pub timeout: Option<String>,
    pub retries: Option<i64>,
    pub start_period: Option<String>,
    #[serde(default)]
    pub disable: bool,
}

impl HealthCheck {
    /// The probe command as a single string, without the `CMD`/`CMD-SHELL` marker.
    pub fn command(&self) -> Option<String> {
        match self.test.as_ref()? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Sequence(parts) => {
                let parts: Vec<String> = parts
                    .iter()
                    .filter_map(|p| p.as_str().map(str::to_string))
                    .collect();
                let args = match parts.first().map(String::as_str) {
                    Some("CMD") | Some("CMD-SHELL") => &parts[1..],
                    Some("NONE") => return None,
                    _ => &parts[..],
                };
                Some(args.join(" "))
            }
            _ => None,
        }
    }
}

/// A `ports:` entry split into host and container side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host: Option<u16>,
    pub container: u16,
}

/// Expands one `ports:` entry into its mappings; ranges yield one mapping per port.
pub fn parse_port(entry: &serde_yaml::Value) -> Option<Vec<PortMapping>> {
    let raw = match entry {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Mapping(map) => {
            let target = map.get("target")?.as_u64()?;
            let published = map
                .get("published")
                .and_then(|p| p.as_u64().or_else(|| p.as_str()?.parse().ok()));
            return Some(vec![PortMapping {
                host: published.and_then(|p| u16::try_from(p).ok()),
                container: u16::try_from(target).ok()?,
            }]);
        }
        _ => return None,
    };

    let raw = raw.split('/').next().unwrap_or_default();
    let parts: Vec<&str> = raw.split(':').collect();
    let (host, container) = match parts.as_slice() {
        [container] => (None, *container),
        [host, container] => (Some(*host), *container),
        [_ip, host, container] => (Some(*host), *container),
        _ => return None,
    };

    let containers = port_range(container)?;
    let Some(host) = host else {
        return Some(
            containers
                .map(|container| PortMapping { host: None, container })
                .collect(),
        );
    };
    let hosts = port_range(host)?;
    if hosts.len() != containers.len() {
        return None;
    }
    Some(
        hosts
            .zip(containers)
            .map(|(host, container)| PortMapping {
                host: Some(host),
                container,
            })
            .collect(),
    )
}

/// `8000` or `8000-8005`; zero and reversed ranges are rejected.
fn port_range(value: &str) -> Option<std::ops::RangeInclusive<u16>> {
    let (start, end) = match value.split_once('-') {
        Some((start, end)) => (start, end),
        None => (value, value),
    };
    let start = start.trim().parse::<u16>().ok().filter(|p| *p > 0)?;
    let end = end.trim().parse::<u16>().ok()?;
    (start <= end).then_some(start..=end)
}

/// Named volume of a `volumes:` entry (`name:/path`); bind mounts return `None`.
pub fn named_volume(entry: &serde_yaml::Value) -> Option<String> {
    let source = match entry {
        serde_yaml::Value::String(s) => s.split(':').next()?.to_string(),
        serde_yaml::Value::Mapping(map) => {
            if map.get("type").and_then(|t| t.as_str()) != Some("volume") {
                return None;
            }
            map.get("source")?.as_str()?.to_string()
        }
        _ => return None,
    };
    let is_path = source.starts_with('.') || source.starts_with('/') || source.starts_with('~');
    (!is_path && !source.is_empty()).then_some(source)
}

/// Parses a compose duration such as `10s`, `1m30s`, `1.5s` or `500ms` into milliseconds.
pub fn parse_duration_ms(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let mut total = 0u64;
    let mut amount = String::new();
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_digit() || c == '.' {
            amount.push(c);
            continue;
        }
        let mut unit = c.to_string();
        while let Some(next) = chars.peek().filter(|n| n.is_ascii_alphabetic()) {
            unit.push(*next);
            chars.next();
        }
        let factor: u64 = match unit.as_str() {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            _ => return None,
        };
        let part = match amount.split_once('.') {
            None => amount.parse::<u64>().ok()?.checked_mul(factor)?,
            Some((whole, fraction)) => {
                let whole = if whole.is_empty() { 0 } else { whole.parse::<u64>().ok()? };
                let millis = format!("0.{}", fraction).parse::<f64>().ok()? * factor as f64;
                whole.checked_mul(factor)?.checked_add(millis.round() as u64)?
            }
        };
        amount.clear();
        total = total.checked_add(part)?;
    }
    if !amount.is_empty() {
        return None;
    }
    Some(total)
}

impl ComposeFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}
