use crate::utils::error::{DevStackError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub const HTTP_SCHEMES: &[&str] = &["http", "https"];
pub const REDIS_SCHEMES: &[&str] = &["redis", "rediss"];
pub const POSTGRES_SCHEMES: &[&str] = &["postgres", "postgresql"];

pub fn validate_url(field_name: &str, url_str: &str, schemes: &[&str]) -> Result<Url> {
    if url_str.is_empty() {
        return Err(DevStackError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    let url = Url::parse(url_str).map_err(|e| DevStackError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: redact_userinfo(url_str),
        reason: format!("Invalid URL format: {}", e),
    })?;

    if !schemes.contains(&url.scheme()) {
        return Err(DevStackError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: redact_userinfo(url_str),
            reason: format!(
                "Unsupported URL scheme: {}. Expected one of: {}",
                url.scheme(),
                schemes.join(", ")
            ),
        });
    }

    Ok(url)
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(DevStackError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DevStackError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(DevStackError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Replaces the password of a connection URL so it can be logged.
pub fn redact_userinfo(url_str: &str) -> String {
    match Url::parse(url_str) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("****"));
            url.to_string()
        }
        _ => url_str.to_string(),
    }
}
