//! Target endpoint configuration

use crate::error::ConfigResult;
use crate::validation::{validate_http_url, validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Endpoint under test
///
/// `target` selects a built-in catalog entry; every other optional field
/// overrides the matching catalog value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Built-in target name (distilbert, logreg, yolov5s)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Function gateway base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Deployed function name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    /// Synchronous (`/function/`) or asynchronous (`/async-function/`) invocation
    #[serde(default)]
    pub invocation: InvocationMode,

    /// JSON array of request payloads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_file: Option<PathBuf>,

    /// Response shape to check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractKind>,

    /// Fields that must be present (custom contract)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    /// Fields that must be JSON arrays (custom contract)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub array_fields: Vec<String>,

    /// Status code counted as success
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,

    /// Per-request timeout overriding `http.timeout`
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_timeout: Option<Duration>,
}

/// Gateway invocation path convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum InvocationMode {
    #[default]
    Sync,
    Async,
}

/// Built-in response contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// `label` and `score` present
    LabelScore,
    /// `prediction` present
    Prediction,
    /// `detections` present and an array
    Detections,
    /// Only the status code is checked
    StatusOnly,
    /// Uses `fields` / `array_fields`
    Custom,
}

impl InvocationMode {
    /// Gateway path segment for this mode
    pub fn path_prefix(&self) -> &'static str {
        match self {
            InvocationMode::Sync => "function",
            InvocationMode::Async => "async-function",
        }
    }
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationMode::Sync => f.write_str("sync"),
            InvocationMode::Async => f.write_str("async"),
        }
    }
}

impl FromStr for InvocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sync" | "function" => Ok(InvocationMode::Sync),
            "async" | "async-function" => Ok(InvocationMode::Async),
            _ => Err(format!("Invalid invocation mode: {}", s)),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            target: None,
            base_url: default_base_url(),
            function_name: None,
            invocation: InvocationMode::Sync,
            payload_file: None,
            contract: None,
            fields: Vec::new(),
            array_fields: Vec::new(),
            expected_status: default_expected_status(),
            request_timeout: None,
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_http_url(&self.base_url, "base_url", self.domain_name())?;

        if let Some(ref name) = self.target {
            validate_required_string(name, "target", self.domain_name())?;
        }

        if let Some(ref function) = self.function_name {
            validate_required_string(function, "function_name", self.domain_name())?;
            if function.contains('/') {
                return Err(self.validation_error("function_name must not contain '/'"));
            }
        }

        if !(100..=599).contains(&self.expected_status) {
            return Err(self.validation_error(format!(
                "expected_status must be a valid HTTP status, got {}",
                self.expected_status
            )));
        }

        if let Some(timeout) = self.request_timeout {
            validate_positive(timeout.as_millis(), "request_timeout", self.domain_name())?;
        }

        let has_custom_fields = !self.fields.is_empty() || !self.array_fields.is_empty();
        match self.contract {
            Some(ContractKind::Custom) if !has_custom_fields => {
                return Err(self.validation_error(
                    "custom contract requires at least one entry in fields or array_fields",
                ));
            }
            Some(ContractKind::Custom) => {}
            _ if has_custom_fields => {
                return Err(self.validation_error(
                    "fields and array_fields are only used with contract: custom",
                ));
            }
            _ => {}
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_expected_status() -> u16 {
    200
}
