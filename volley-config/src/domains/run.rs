//! Run configuration: traffic shape, thresholds and timing

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Run configuration
///
/// A run starts from an optional named preset. Explicit `stages`,
/// `vus`/`iterations`/`duration` and `thresholds` replace the preset's.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Named traffic preset (smoke, ramp-up, burst-spike, realistic-soak)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    /// Free-form run tag; defaults to the preset name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Fixed number of virtual users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vus: Option<u32>,

    /// Total iterations shared by all virtual users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,

    /// Fixed run duration for constant virtual users
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,

    /// Virtual users before the first stage starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_vus: Option<u32>,

    /// Ramping stages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<StageConfig>>,

    /// Metric name to threshold expressions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<BTreeMap<String, Vec<ThresholdConfig>>>,

    /// Pause after every iteration
    #[serde(with = "humantime_serde", default = "default_think_time")]
    pub think_time: Duration,

    /// How long in-flight iterations may finish after the schedule ends
    #[serde(with = "humantime_serde", default = "default_graceful_stop")]
    pub graceful_stop: Duration,

    /// Upper bound for iteration-based runs
    #[serde(with = "humantime_serde", default = "default_max_duration")]
    pub max_duration: Duration,

    /// Interval of progress log lines and abort-on-fail evaluation
    #[serde(with = "humantime_serde", default = "default_progress_interval")]
    pub progress_interval: Duration,

    /// How often the ramping executor re-evaluates its target
    #[serde(with = "humantime_serde", default = "default_scheduler_tick")]
    pub scheduler_tick: Duration,

    /// Write the JSON run summary to this path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_export: Option<PathBuf>,
}

/// One ramp segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Segment length
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Virtual users at the end of the segment
    pub target: u32,
}

/// Threshold entry, either a bare expression or the detailed form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdConfig {
    Expression(String),
    Detailed {
        threshold: String,
        #[serde(default)]
        abort_on_fail: bool,
        #[serde(
            default,
            with = "humantime_serde",
            skip_serializing_if = "Option::is_none"
        )]
        delay_abort_eval: Option<Duration>,
    },
}

impl ThresholdConfig {
    pub fn expression(&self) -> &str {
        match self {
            ThresholdConfig::Expression(expr) => expr,
            ThresholdConfig::Detailed { threshold, .. } => threshold,
        }
    }

    pub fn abort_on_fail(&self) -> bool {
        matches!(self, ThresholdConfig::Detailed { abort_on_fail: true, .. })
    }

    pub fn delay_abort_eval(&self) -> Option<Duration> {
        match self {
            ThresholdConfig::Expression(_) => None,
            ThresholdConfig::Detailed {
                delay_abort_eval, ..
            } => *delay_abort_eval,
        }
    }
}

impl StageConfig {
    pub fn new(duration: Duration, target: u32) -> Self {
        Self { duration, target }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            preset: None,
            tag: None,
            vus: None,
            iterations: None,
            duration: None,
            start_vus: None,
            stages: None,
            thresholds: None,
            think_time: default_think_time(),
            graceful_stop: default_graceful_stop(),
            max_duration: default_max_duration(),
            progress_interval: default_progress_interval(),
            scheduler_tick: default_scheduler_tick(),
            summary_export: None,
        }
    }
}

impl RunConfig {
    /// Whether the config describes a load profile without a preset
    pub fn has_explicit_profile(&self) -> bool {
        self.stages.is_some() || self.iterations.is_some() || self.duration.is_some()
    }
}

impl Validatable for RunConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(ref preset) = self.preset {
            validate_required_string(preset, "preset", self.domain_name())?;
        }

        if let Some(ref tag) = self.tag {
            validate_required_string(tag, "tag", self.domain_name())?;
        }

        if let Some(vus) = self.vus {
            validate_positive(vus, "vus", self.domain_name())?;
        }

        if let Some(iterations) = self.iterations {
            validate_positive(iterations, "iterations", self.domain_name())?;
        }

        if let Some(duration) = self.duration {
            validate_positive(duration.as_millis(), "duration", self.domain_name())?;
        }

        if let Some(ref stages) = self.stages {
            if stages.is_empty() {
                return Err(self.validation_error("stages cannot be an empty list"));
            }
            if stages.iter().all(|s| s.duration.is_zero()) {
                return Err(self.validation_error("stages must last longer than zero"));
            }
            if self.iterations.is_some() {
                return Err(self.validation_error("stages cannot be combined with iterations"));
            }
            if self.duration.is_some() || self.vus.is_some() {
                return Err(self.validation_error(
                    "stages cannot be combined with vus or duration (use start_vus)",
                ));
            }
        } else if self.start_vus.is_some() {
            return Err(self.validation_error("start_vus is only used together with stages"));
        }

        if let Some(ref thresholds) = self.thresholds {
            for (metric, entries) in thresholds {
                validate_required_string(metric, "threshold metric", self.domain_name())?;
                for entry in entries {
                    validate_required_string(
                        entry.expression(),
                        &format!("threshold for {}", metric),
                        self.domain_name(),
                    )?;
                }
            }
        }

        validate_positive(
            self.max_duration.as_millis(),
            "max_duration",
            self.domain_name(),
        )?;
        validate_positive(
            self.progress_interval.as_millis(),
            "progress_interval",
            self.domain_name(),
        )?;
        validate_positive(
            self.scheduler_tick.as_millis(),
            "scheduler_tick",
            self.domain_name(),
        )?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "run"
    }
}

// Default value functions
fn default_think_time() -> Duration {
    Duration::from_secs(1)
}

fn default_graceful_stop() -> Duration {
    Duration::from_secs(30)
}

fn default_max_duration() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_progress_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_scheduler_tick() -> Duration {
    Duration::from_millis(250)
}
