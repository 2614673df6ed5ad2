//! Per-domain validation

use crate::error::{ConfigError, ConfigResult};
use std::fmt::Display;

/// A configuration domain that can check its own values
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;

    /// Section name used in error messages (`http`, `run`, ...)
    fn domain_name(&self) -> &'static str;

    fn validation_error(&self, message: impl Into<String>) -> ConfigError
    where
        Self: Sized,
    {
        domain_error(self.domain_name(), message)
    }
}

fn domain_error(domain: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::DomainError {
        domain: domain.to_string(),
        message: message.into(),
    }
}

pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(domain_error(domain, format!("{} cannot be empty", field_name)));
    }
    Ok(())
}

pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + Display,
{
    if value <= T::default() {
        return Err(domain_error(
            domain,
            format!("{} must be greater than 0, got {}", field_name, value),
        ));
    }
    Ok(())
}

/// Gateway base URL: http(s), a host, no query or fragment
///
/// Function paths are appended to it, so anything after the path would end
/// up in the middle of the request URL.
pub fn validate_http_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(url, field_name, domain)?;

    let parsed = url::Url::parse(url)
        .map_err(|e| domain_error(domain, format!("{} is not a valid URL: {}", field_name, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(domain_error(
            domain,
            format!(
                "{} scheme '{}' not supported (only http/https)",
                field_name,
                parsed.scheme()
            ),
        ));
    }
    if parsed.host_str().is_none() {
        return Err(domain_error(domain, format!("{} must have a host", field_name)));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(domain_error(
            domain,
            format!("{} must not carry a query string or fragment", field_name),
        ));
    }
    Ok(())
}
