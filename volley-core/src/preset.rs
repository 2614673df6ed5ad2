//! Named traffic presets

use crate::error::CoreError;
use crate::profile::LoadProfile;
use crate::stage::{Schedule, Stage};
use crate::threshold::{Aggregation, Comparison, MetricName, Threshold};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Iteration-based presets stop after this long even if work remains
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(600);

const RAMP_UP: &[Stage] = &[
    Stage::secs(30, 3),
    Stage::secs(60, 3),
    Stage::secs(30, 5),
    Stage::secs(60, 5),
    Stage::secs(30, 10),
    Stage::secs(60, 10),
    Stage::secs(30, 0),
];

const BURST_SPIKE: &[Stage] = &[
    Stage::secs(30, 3),
    Stage::secs(60, 3),
    Stage::secs(30, 5),
    Stage::secs(10, 20),
    Stage::secs(60, 5),
    Stage::secs(10, 25),
    Stage::secs(30, 0),
];

const REALISTIC_SOAK: &[Stage] = &[
    Stage::secs(30, 3),
    Stage::secs(60, 3),
    Stage::secs(120, 8),
    Stage::secs(300, 8),
    Stage::secs(60, 12),
    Stage::secs(180, 12),
    Stage::secs(60, 5),
    Stage::secs(120, 5),
    Stage::secs(30, 0),
];

/// Built-in traffic shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// One user, five requests: is the endpoint alive?
    Smoke,
    /// Stepped ramp to 10 users
    RampUp,
    /// Ramp with two short spikes to 20 and 25 users
    BurstSpike,
    /// Long multi-plateau run peaking at 12 users
    RealisticSoak,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Smoke,
        Preset::RampUp,
        Preset::BurstSpike,
        Preset::RealisticSoak,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Smoke => "smoke",
            Preset::RampUp => "ramp-up",
            Preset::BurstSpike => "burst-spike",
            Preset::RealisticSoak => "realistic-soak",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::Smoke => "1 VU, 5 iterations; verifies the endpoint answers correctly",
            Preset::RampUp => "Steps 3 -> 5 -> 10 VUs with one-minute plateaus",
            Preset::BurstSpike => "Plateaus at 3 and 5 VUs with sudden spikes to 20 and 25",
            Preset::RealisticSoak => "16 minutes of plateaus at 3, 8, 12 and 5 VUs",
        }
    }

    pub fn profile(&self) -> LoadProfile {
        match self {
            Preset::Smoke => LoadProfile::SharedIterations {
                vus: 1,
                iterations: 5,
                max_duration: DEFAULT_MAX_DURATION,
            },
            Preset::RampUp => ramping(RAMP_UP),
            Preset::BurstSpike => ramping(BURST_SPIKE),
            Preset::RealisticSoak => ramping(REALISTIC_SOAK),
        }
    }

    pub fn thresholds(&self) -> Vec<Threshold> {
        let failure_rate = |limit| {
            Threshold::new(MetricName::HttpReqFailed, Aggregation::Rate, Comparison::Lt, limit)
        };
        match self {
            Preset::Smoke => vec![
                failure_rate(0.01),
                Threshold::new(
                    MetricName::HttpReqDuration,
                    Aggregation::Percentile(95.0),
                    Comparison::Lt,
                    500.0,
                ),
            ],
            Preset::RampUp | Preset::RealisticSoak => vec![failure_rate(0.02)],
            Preset::BurstSpike => vec![failure_rate(0.05)],
        }
    }
}

fn ramping(stages: &[Stage]) -> LoadProfile {
    LoadProfile::Ramping(Schedule::new(1, stages.to_vec()))
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| CoreError::UnknownPreset(s.to_string()))
    }
}
