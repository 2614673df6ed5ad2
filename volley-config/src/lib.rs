//! Domain-driven configuration management for Volley
//!
//! Configuration is split by functional domain (HTTP client, logging,
//! target endpoint, run shape), each with its own defaults and validation,
//! and can be loaded from YAML with `VOLLEY_*` environment overrides.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    http::{HttpConfig, PoolConfig},
    logging::LoggingConfig,
    run::{RunConfig, StageConfig, ThresholdConfig},
    target::{ContractKind, InvocationMode, TargetConfig},
    VolleyConfig,
};

// Re-export utilities
pub use domains::utils::{parse_duration, serde_duration};
