//! Loading configuration from YAML with `VOLLEY_*` environment overrides
//!
//! Environment variables win over the file. Each variable is
//! `<PREFIX>_<NAME>`:
//!
//! | variable | field |
//! |---|---|
//! | `HTTP_TIMEOUT`, `HTTP_USER_AGENT`, `HTTP_VERIFY_SSL` | `http.*` |
//! | `LOG_LEVEL`, `LOG_FORMAT` | `logging.*` |
//! | `TARGET`, `BASE_URL`, `FUNCTION_NAME`, `INVOCATION`, `PAYLOAD_FILE`, `EXPECTED_STATUS`, `REQUEST_TIMEOUT` | `target.*` |
//! | `PRESET`, `TAG`, `VUS`, `ITERATIONS`, `DURATION`, `THINK_TIME`, `SUMMARY_EXPORT` | `run.*` |

use crate::domains::http::HttpConfig;
use crate::domains::logging::LoggingConfig;
use crate::domains::run::RunConfig;
use crate::domains::target::TargetConfig;
use crate::domains::utils::parse_duration;
use crate::domains::VolleyConfig;
use crate::error::{ConfigError, ConfigResult};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub struct ConfigLoader {
    prefix: String,
}

impl ConfigLoader {
    /// Loader reading `VOLLEY_*` variables
    pub fn new() -> Self {
        Self::with_prefix("VOLLEY")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<VolleyConfig> {
        let content = std::fs::read_to_string(path)?;
        self.from_yaml_str(&content)
    }

    pub fn from_yaml_str(&self, content: &str) -> ConfigResult<VolleyConfig> {
        // An empty document deserializes to unit, not to an empty map
        let mut config: VolleyConfig = if content.trim().is_empty() {
            VolleyConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env(&self) -> ConfigResult<VolleyConfig> {
        let mut config = VolleyConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<VolleyConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut VolleyConfig) -> ConfigResult<()> {
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_target_overrides(&mut config.target)?;
        self.apply_run_overrides(&mut config.run)?;
        Ok(())
    }

    fn apply_http_overrides(&self, config: &mut HttpConfig) -> ConfigResult<()> {
        if let Some(timeout) = self.env_duration("HTTP_TIMEOUT")? {
            config.timeout = timeout;
        }
        if let Some(user_agent) = self.env_string("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(verify_ssl) = self.env_parsed("HTTP_VERIFY_SSL")? {
            config.verify_ssl = verify_ssl;
        }
        Ok(())
    }

    fn apply_logging_overrides(&self, config: &mut LoggingConfig) -> ConfigResult<()> {
        if let Some(level) = self.env_parsed("LOG_LEVEL")? {
            config.level = level;
        }
        if let Some(format) = self.env_parsed("LOG_FORMAT")? {
            config.format = format;
        }
        Ok(())
    }

    fn apply_target_overrides(&self, config: &mut TargetConfig) -> ConfigResult<()> {
        if let Some(target) = self.env_string("TARGET") {
            config.target = Some(target);
        }
        if let Some(base_url) = self.env_string("BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(function) = self.env_string("FUNCTION_NAME") {
            config.function_name = Some(function);
        }
        if let Some(invocation) = self.env_parsed("INVOCATION")? {
            config.invocation = invocation;
        }
        if let Some(payload_file) = self.env_string("PAYLOAD_FILE") {
            config.payload_file = Some(PathBuf::from(payload_file));
        }
        if let Some(status) = self.env_parsed("EXPECTED_STATUS")? {
            config.expected_status = status;
        }
        if let Some(timeout) = self.env_duration("REQUEST_TIMEOUT")? {
            config.request_timeout = Some(timeout);
        }
        Ok(())
    }

    fn apply_run_overrides(&self, config: &mut RunConfig) -> ConfigResult<()> {
        if let Some(preset) = self.env_string("PRESET") {
            config.preset = Some(preset);
        }
        if let Some(tag) = self.env_string("TAG") {
            config.tag = Some(tag);
        }
        if let Some(vus) = self.env_parsed("VUS")? {
            config.vus = Some(vus);
        }
        if let Some(iterations) = self.env_parsed("ITERATIONS")? {
            config.iterations = Some(iterations);
        }
        if let Some(duration) = self.env_duration("DURATION")? {
            config.duration = Some(duration);
        }
        if let Some(think_time) = self.env_duration("THINK_TIME")? {
            config.think_time = think_time;
        }
        if let Some(path) = self.env_string("SUMMARY_EXPORT") {
            config.summary_export = Some(PathBuf::from(path));
        }
        Ok(())
    }

    fn variable(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }

    /// Set, non-empty variable
    fn env_string(&self, name: &str) -> Option<String> {
        let variable = self.variable(name);
        let value = std::env::var(&variable).ok()?;
        if value.trim().is_empty() {
            return None;
        }
        debug!(variable = %variable, "Applying environment override");
        Some(value)
    }

    fn env_parsed<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.env_with(name, |value| value.trim().parse::<T>().map_err(|e| e.to_string()))
    }

    fn env_duration(&self, name: &str) -> ConfigResult<Option<Duration>> {
        self.env_with(name, parse_duration)
    }

    fn env_with<T>(
        &self,
        name: &str,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> ConfigResult<Option<T>> {
        match self.env_string(name) {
            Some(value) => parse(&value)
                .map(Some)
                .map_err(|reason| ConfigError::EnvError {
                    variable: self.variable(name),
                    value,
                    reason,
                }),
            None => Ok(None),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_env::with_vars;

    #[test]
    fn test_blank_variable_is_ignored() {
        with_vars(
            vec![("VOLLEY_UNIT_PRESET", Some("  ")), ("VOLLEY_UNIT_VUS", Some("4"))],
            || {
                let config = ConfigLoader::with_prefix("VOLLEY_UNIT").from_env();
                // vus without iterations or duration is still a valid config
                let config = config.unwrap();
                assert!(config.run.preset.is_none());
                assert_eq!(config.run.vus, Some(4));
            },
        );
    }

    #[test]
    fn test_env_error_names_variable() {
        with_vars(vec![("VOLLEY_UNIT2_EXPECTED_STATUS", Some("ok"))], || {
            let err = ConfigLoader::with_prefix("VOLLEY_UNIT2")
                .from_env()
                .unwrap_err();
            match err {
                ConfigError::EnvError {
                    variable, value, ..
                } => {
                    assert_eq!(variable, "VOLLEY_UNIT2_EXPECTED_STATUS");
                    assert_eq!(value, "ok");
                }
                other => panic!("unexpected error: {other}"),
            }
        });
    }

    #[test]
    fn test_env_wins_over_file() {
        with_vars(
            vec![
                ("VOLLEY_UNIT4_PRESET", Some("ramp-up")),
                ("VOLLEY_UNIT4_BASE_URL", Some("http://gateway:8080")),
            ],
            || {
                let yaml = "target:\n  base_url: http://127.0.0.1:8080\nrun:\n  preset: smoke\n";
                let config = ConfigLoader::with_prefix("VOLLEY_UNIT4")
                    .from_yaml_str(yaml)
                    .unwrap();
                assert_eq!(config.run.preset.as_deref(), Some("ramp-up"));
                assert_eq!(config.target.base_url, "http://gateway:8080");
            },
        );
    }

    #[test]
    fn test_run_duration_overrides() {
        with_vars(
            vec![
                ("VOLLEY_UNIT3_ITERATIONS", Some("20")),
                ("VOLLEY_UNIT3_THINK_TIME", Some("250ms")),
                ("VOLLEY_UNIT3_REQUEST_TIMEOUT", Some("5")),
            ],
            || {
                let config = ConfigLoader::with_prefix("VOLLEY_UNIT3").from_env().unwrap();
                assert_eq!(config.run.iterations, Some(20));
                assert_eq!(config.run.think_time, Duration::from_millis(250));
                assert_eq!(config.target.request_timeout, Some(Duration::from_secs(5)));
            },
        );
    }
}
