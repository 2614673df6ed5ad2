//! Traffic stages and the ramping schedule built from them

use serde::{Deserialize, Serialize};
use std::time::Duration;
use volley_config::StageConfig;

/// Rounding slack so that e.g. 2.9999999 still floors to 3
const VU_EPSILON: f64 = 1e-9;

/// One segment of a ramping schedule
///
/// Over `duration` the number of virtual users moves linearly from the
/// previous segment's target to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub target: u32,
}

impl Stage {
    pub fn new(duration: Duration, target: u32) -> Self {
        Self { duration, target }
    }

    /// Shorthand used by the preset tables
    pub const fn secs(secs: u64, target: u32) -> Self {
        Self {
            duration: Duration::from_secs(secs),
            target,
        }
    }
}

impl From<&StageConfig> for Stage {
    fn from(config: &StageConfig) -> Self {
        Self::new(config.duration, config.target)
    }
}

/// Ordered list of stages plus the starting population
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub start_vus: u32,
    pub stages: Vec<Stage>,
}

impl Schedule {
    pub fn new(start_vus: u32, stages: Vec<Stage>) -> Self {
        Self { start_vus, stages }
    }

    /// Sum of all stage durations
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Highest population the schedule ever asks for
    pub fn max_target(&self) -> u32 {
        self.stages
            .iter()
            .map(|s| s.target)
            .fold(self.start_vus, u32::max)
    }

    /// Interpolated (fractional) target at `elapsed` since run start
    pub fn target_at(&self, elapsed: Duration) -> f64 {
        let mut from = f64::from(self.start_vus);
        let mut offset = Duration::ZERO;

        for stage in &self.stages {
            let end = offset + stage.duration;
            if elapsed < end {
                // elapsed >= offset here, and end > offset so the stage is non-empty
                let progress =
                    (elapsed - offset).as_secs_f64() / stage.duration.as_secs_f64();
                return from + (f64::from(stage.target) - from) * progress;
            }
            from = f64::from(stage.target);
            offset = end;
        }

        from
    }

    /// Whole number of virtual users that should be running at `elapsed`
    pub fn vus_at(&self, elapsed: Duration) -> u32 {
        let target = self.target_at(elapsed).max(0.0);
        (target + VU_EPSILON).floor() as u32
    }

    /// Index of the stage active at `elapsed`, `None` once the schedule ended
    pub fn stage_index_at(&self, elapsed: Duration) -> Option<usize> {
        let mut offset = Duration::ZERO;
        for (index, stage) in self.stages.iter().enumerate() {
            offset += stage.duration;
            if elapsed < offset {
                return Some(index);
            }
        }
        None
    }

    /// True once every stage has run to completion
    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.total_duration()
    }
}
