//! Configuration sections, one module per domain

pub mod http;
pub mod logging;
pub mod run;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

const SAMPLE_HEADER: &str = "\
# Volley configuration
#
# Every key is optional. VOLLEY_<NAME> environment variables override the
# file (VOLLEY_PRESET, VOLLEY_BASE_URL, VOLLEY_THINK_TIME, ...).
";

/// A whole configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VolleyConfig {
    pub http: http::HttpConfig,

    pub logging: logging::LoggingConfig,

    /// Function under test
    pub target: target::TargetConfig,

    /// Traffic shape and pass/fail rules
    pub run: run::RunConfig,
}

impl VolleyConfig {
    /// Validates the sections in file order, stopping at the first error
    pub fn validate_all(&self) -> ConfigResult<()> {
        let sections: [&dyn Validatable; 4] = [&self.http, &self.logging, &self.target, &self.run];
        sections.iter().try_for_each(|section| section.validate())
    }

    /// Starter file: the distilbert target under the smoke preset
    pub fn generate_sample() -> ConfigResult<String> {
        let mut config = VolleyConfig::default();
        config.target.target = Some("distilbert".to_string());
        config.run.preset = Some("smoke".to_string());
        let body = serde_yaml::to_string(&config)?;
        Ok(format!("{}\n{}", SAMPLE_HEADER, body))
    }
}
