//! Errors raised while loading and validating configuration

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    /// The file is not valid YAML or does not match the schema
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A `VOLLEY_*` variable holds a value of the wrong shape
    #[error("Invalid value '{value}' for {variable}: {reason}")]
    EnvError {
        variable: String,
        value: String,
        reason: String,
    },

    /// A value parsed but breaks a rule of its domain (`http`, `run`, ...)
    #[error("Domain configuration error in {domain}: {message}")]
    DomainError { domain: String, message: String },
}
