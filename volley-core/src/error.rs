//! Core error types for Volley

use std::path::PathBuf;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum CoreError {
    /// Payload loading or generation errors
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Threshold parsing errors
    #[error("Threshold error: {0}")]
    Threshold(#[from] ThresholdError),

    /// Unknown preset name
    #[error("Unknown preset '{0}'. Available presets: smoke, ramp-up, burst-spike, realistic-soak")]
    UnknownPreset(String),

    /// Unknown built-in target
    #[error("Unknown target '{0}'. Available targets: distilbert, logreg, yolov5s")]
    UnknownTarget(String),

    /// The run configuration does not describe a runnable plan
    #[error("Invalid run plan: {0}")]
    Plan(String),

    /// The target configuration is incomplete
    #[error("Invalid target: {0}")]
    Target(String),
}

/// Result type alias for core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Payload-related errors
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Failed to read payload file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write payload file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Payload file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Payload file {path} must contain a JSON array, found {found}")]
    NotAnArray { path: PathBuf, found: &'static str },

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Threshold parsing errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("Unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("Invalid threshold expression '{expression}': {reason}")]
    Syntax { expression: String, reason: String },

    #[error("Aggregation '{aggregation}' is not available for {kind} metric '{metric}'")]
    Aggregation {
        metric: String,
        kind: &'static str,
        aggregation: String,
    },
}
