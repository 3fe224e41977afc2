use crate::adapters::http::build_client;
use crate::utils::error::Result;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum EndpointState {
    Ok,
    Responded(u16),
    NoResponse,
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointState::Ok => write!(f, "🟢 OK"),
            EndpointState::Responded(status) => write!(f, "🟡 responded (Status: {})", status),
            EndpointState::NoResponse => write!(f, "🔴 no response"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointCheck {
    pub name: String,
    pub url: String,
    pub state: EndpointState,
}

/// GETs every MCP endpoint concurrently; results keep the input order.
pub async fn probe_endpoints(
    endpoints: &[(String, String)],
    timeout: Duration,
) -> Result<Vec<EndpointCheck>> {
    let client = build_client(timeout)?;

    let handles: Vec<_> = endpoints
        .iter()
        .map(|(name, url)| {
            let client = client.clone();
            let url = url.clone();
            (
                name.clone(),
                url.clone(),
                tokio::spawn(async move {
                    match client.get(&url).send().await {
                        Ok(response) if response.status().as_u16() == 200 => EndpointState::Ok,
                        Ok(response) => EndpointState::Responded(response.status().as_u16()),
                        Err(e) => {
                            tracing::debug!("{} did not respond: {}", url, e);
                            EndpointState::NoResponse
                        }
                    }
                }),
            )
        })
        .collect();

    let mut checks = Vec::with_capacity(handles.len());
    for (name, url, handle) in handles {
        let state = handle.await.unwrap_or(EndpointState::NoResponse);
        checks.push(EndpointCheck { name, url, state });
    }
    Ok(checks)
}
