use crate::domain::model::truncate_chars;
use crate::utils::error::{DevStackError, Result};
use reqwest::{Client, Response};
use std::time::Duration;

const ERROR_BODY_LIMIT: usize = 200;

pub fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("mcp-devstack/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Passes 2xx responses through; anything else becomes an `UpstreamError` carrying the body.
pub async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!("{} responded with {}: {}", service, status, body);
    Err(DevStackError::UpstreamError {
        service: service.to_string(),
        status: status.as_u16(),
        body: truncate_chars(&body, ERROR_BODY_LIMIT),
    })
}
