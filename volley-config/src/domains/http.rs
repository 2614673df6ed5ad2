//! Client settings for talking to the function gateway

use crate::domains::utils::serde_duration;
use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One pooled client is shared by every virtual user, so the pool should
/// hold at least as many idle connections as the run has VUs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout; a target's `request_timeout` takes precedence
    #[serde(with = "serde_duration")]
    pub timeout: Duration,

    /// TCP and TLS handshake timeout
    #[serde(with = "serde_duration")]
    pub connect_timeout: Duration,

    pub user_agent: String,

    pub verify_ssl: bool,

    /// Gateways answer directly; 0 disables redirects
    pub max_redirects: u32,

    pub pool: PoolConfig,
}

/// Keep-alive pool of the shared client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_idle_per_host: usize,

    #[serde(with = "serde_duration")]
    pub idle_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            // Cold inference containers can take tens of seconds to answer
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("volley/{}", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
            max_redirects: 0,
            pool: PoolConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 32,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.timeout.as_millis(), "timeout", self.domain_name())?;
        validate_positive(
            self.connect_timeout.as_millis(),
            "connect_timeout",
            self.domain_name(),
        )?;
        if self.connect_timeout > self.timeout {
            return Err(self.validation_error(format!(
                "connect_timeout ({:?}) cannot exceed timeout ({:?})",
                self.connect_timeout, self.timeout
            )));
        }
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        self.pool.validate()
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

impl Validatable for PoolConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.max_idle_per_host,
            "max_idle_per_host",
            self.domain_name(),
        )?;
        validate_positive(
            self.idle_timeout.as_millis(),
            "idle_timeout",
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "http.pool"
    }
}
