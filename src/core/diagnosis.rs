use crate::config::settings::is_placeholder;
use crate::config::StackConfig;
use crate::domain::model::ServiceKind;
use crate::utils::monitor::ProcessMonitor;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::Command;
use url::Url;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
const REQUIRED_KEYS: &[&str] = &["OPENAI_API_KEY", "PG_CONN_STR"];

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisItem {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl DiagnosisItem {
    fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DiagnosisItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = if self.passed { "✅" } else { "❌" };
        write!(f, "{} {}: {}", icon, self.name, self.detail)
    }
}

/// Runs a command and returns the first line of its stdout.
async fn command_version(program: &str, args: &[&str]) -> Result<String, String> {
    let output = tokio::time::timeout(COMMAND_TIMEOUT, Command::new(program).args(args).output())
        .await
        .map_err(|_| format!("timed out after {}s", COMMAND_TIMEOUT.as_secs()))?
        .map_err(|e| e.to_string())?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(stderr.lines().next().unwrap_or("non-zero exit").to_string());
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}

/// Host and port a service is reached on according to the configuration.
pub fn service_address(config: &StackConfig, service: ServiceKind) -> Option<(String, u16)> {
    let url = match service {
        ServiceKind::Redis => return Some((config.redis.host.clone(), config.redis.port)),
        ServiceKind::Postgres => &config.postgres_url,
        ServiceKind::Elasticsearch => &config.elastic_url,
        ServiceKind::Qdrant => &config.qdrant_url,
    };
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?.to_string();
    let port = url.port().unwrap_or_else(|| service.default_port());
    Some((host, port))
}

pub async fn check_port(host: &str, port: u16, timeout: Duration) -> Result<(), String> {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}s", timeout.as_secs())),
    }
}

pub fn check_required_keys(values: &HashMap<String, String>) -> Vec<DiagnosisItem> {
    REQUIRED_KEYS
        .iter()
        .map(|key| match values.get(*key) {
            Some(value) if !is_placeholder(value) => DiagnosisItem::pass(*key, "set"),
            Some(_) => DiagnosisItem::fail(*key, "still the template placeholder"),
            None => DiagnosisItem::fail(*key, "not set"),
        })
        .collect()
}

/// Toolchain, ports, required settings and own memory use.
pub async fn run_diagnosis(
    config: &StackConfig,
    values: &HashMap<String, String>,
) -> Vec<DiagnosisItem> {
    let mut items = Vec::new();

    items.push(match command_version("docker", &["--version"]).await {
        Ok(version) => DiagnosisItem::pass("Docker", version),
        Err(e) => DiagnosisItem::fail("Docker", e),
    });
    items.push(match command_version("docker", &["compose", "version"]).await {
        Ok(version) => DiagnosisItem::pass("Docker Compose", version),
        Err(e) => DiagnosisItem::fail("Docker Compose", e),
    });

    for service in ServiceKind::ALL {
        let name = format!("{} port", service);
        let item = match service_address(config, service) {
            Some((host, port)) => match check_port(&host, port, config.probe_timeout()).await {
                Ok(()) => DiagnosisItem::pass(name, format!("{}:{} reachable", host, port)),
                Err(e) => DiagnosisItem::fail(name, format!("{}:{} {}", host, port, e)),
            },
            None => DiagnosisItem::fail(name, "no host in configured URL"),
        };
        items.push(item);
    }

    items.extend(check_required_keys(values));

    let monitor = ProcessMonitor::new(true);
    items.push(match monitor.sample() {
        Some(stats) => DiagnosisItem::pass(
            "Memory",
            format!(
                "{}MB ({:.1}% of system memory)",
                stats.memory_usage_mb, stats.memory_usage_percent
            ),
        ),
        None => DiagnosisItem::fail("Memory", "process statistics unavailable"),
    });

    items
}
