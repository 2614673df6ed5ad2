//! HTTP configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use volley_config::HttpConfig as ConfigHttpConfig;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Maximum number of redirects to follow
    pub max_redirects: u32,

    /// User agent string
    pub user_agent: String,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,

    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,

    /// How long an idle connection stays in the pool
    pub pool_idle_timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        ConfigHttpConfig::default().into()
    }
}

impl From<ConfigHttpConfig> for HttpConfig {
    fn from(config: ConfigHttpConfig) -> Self {
        Self {
            timeout: config.timeout,
            max_redirects: config.max_redirects,
            user_agent: config.user_agent,
            verify_ssl: config.verify_ssl,
            pool_max_idle_per_host: config.pool.max_idle_per_host,
            pool_idle_timeout: config.pool.idle_timeout,
            connect_timeout: config.connect_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_domain() {
        let mut domain = ConfigHttpConfig::default();
        domain.timeout = Duration::from_secs(5);
        domain.verify_ssl = false;
        domain.pool.max_idle_per_host = 4;

        let config = HttpConfig::from(domain);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.verify_ssl);
        assert_eq!(config.pool_max_idle_per_host, 4);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_default_matches_config_domain() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("volley/"));
    }
}
