//! Driver error types

use std::path::PathBuf;
use thiserror::Error;
use volley_core::CoreError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to create latency histogram: {0}")]
    Histogram(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to write summary to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode summary: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;
