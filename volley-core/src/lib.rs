//! Core domain model for Volley
//!
//! This crate defines the vocabulary of a load run: traffic stages and
//! load profiles, named presets, thresholds over aggregate metrics,
//! response contracts, target endpoints and the payload set. It performs
//! no I/O beyond reading and writing payload files.

pub mod contract;
pub mod error;
pub mod generate;
pub mod payload;
pub mod plan;
pub mod preset;
pub mod profile;
pub mod stage;
pub mod target;
pub mod threshold;

// Re-export commonly used types at the crate root
pub use contract::{CheckOutcome, FieldRule, ResponseContract};
pub use error::{CoreError, CoreResult, PayloadError, ThresholdError};
pub use payload::{Payload, PayloadSet};
pub use plan::RunPlan;
pub use preset::Preset;
pub use profile::LoadProfile;
pub use stage::{Schedule, Stage};
pub use target::{BuiltinTarget, Endpoint, BUILTIN_TARGETS};
pub use threshold::{
    Aggregation, Comparison, MetricKind, MetricName, MetricSource, Threshold, ThresholdOutcome,
};
