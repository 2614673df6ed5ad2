//! Load generation for Volley
//!
//! A [`LoadDriver`] turns a [`volley_core::RunPlan`] into traffic: it keeps
//! a pool of virtual users sized to the plan's load profile, folds every
//! response into shared [`RunMetrics`], and evaluates thresholds into a
//! [`RunSummary`].

pub mod driver;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod pool;
pub mod progress;
pub mod summary;
pub mod vu;

#[cfg(test)]
mod testing;

pub use driver::LoadDriver;
pub use error::{DriverError, DriverResult};
pub use metrics::{CheckStats, MetricsSnapshot, RunMetrics, TrendStats};
pub use pool::VuPool;
pub use summary::{RunSummary, Verdict};
pub use vu::{IterationBudget, IterationOutcome, IterationResult, VirtualUser};

// Run-level cancellation comes from callers (Ctrl-C handlers, tests)
pub use tokio_util::sync::CancellationToken;
