//! Logging setup for Volley
//!
//! Installs a global `tracing` subscriber configured from the logging
//! domain of the run configuration.

mod init;

pub use init::{env_filter_directives, init_logging_from_config, init_simple_tracing};
pub use volley_config::domains::logging::{LogFormat, LogLevel};
pub use volley_config::LoggingConfig;
