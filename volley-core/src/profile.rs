//! Load profiles: how many virtual users run, and for how long

use crate::stage::Schedule;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shape of the traffic a run produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "executor", rename_all = "kebab-case")]
pub enum LoadProfile {
    /// Population follows a stage schedule
    #[serde(rename = "ramping-vus")]
    Ramping(Schedule),

    /// A fixed pool works through a shared iteration budget
    SharedIterations {
        vus: u32,
        iterations: u64,
        #[serde(with = "humantime_serde")]
        max_duration: Duration,
    },

    /// A fixed pool runs for a fixed time
    #[serde(rename = "constant-vus")]
    Constant {
        vus: u32,
        #[serde(with = "humantime_serde")]
        duration: Duration,
    },
}

impl LoadProfile {
    /// Executor name as shown in reports
    pub fn executor_name(&self) -> &'static str {
        match self {
            LoadProfile::Ramping(_) => "ramping-vus",
            LoadProfile::SharedIterations { .. } => "shared-iterations",
            LoadProfile::Constant { .. } => "constant-vus",
        }
    }

    /// Largest number of concurrent virtual users
    pub fn max_vus(&self) -> u32 {
        match self {
            LoadProfile::Ramping(schedule) => schedule.max_target(),
            LoadProfile::SharedIterations { vus, .. } | LoadProfile::Constant { vus, .. } => *vus,
        }
    }

    /// Planned length of the run, excluding the graceful stop.
    /// Iteration-based runs report their upper bound.
    pub fn planned_duration(&self) -> Duration {
        match self {
            LoadProfile::Ramping(schedule) => schedule.total_duration(),
            LoadProfile::SharedIterations { max_duration, .. } => *max_duration,
            LoadProfile::Constant { duration, .. } => *duration,
        }
    }

    /// One-line human description
    pub fn describe(&self) -> String {
        match self {
            LoadProfile::Ramping(schedule) => format!(
                "ramping-vus: {} stages over {}s, up to {} VUs (start {})",
                schedule.stages.len(),
                schedule.total_duration().as_secs(),
                schedule.max_target(),
                schedule.start_vus
            ),
            LoadProfile::SharedIterations {
                vus,
                iterations,
                max_duration,
            } => format!(
                "shared-iterations: {} iterations across {} VUs (max {}s)",
                iterations,
                vus,
                max_duration.as_secs()
            ),
            LoadProfile::Constant { vus, duration } => {
                format!("constant-vus: {} VUs for {}s", vus, duration.as_secs())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    #[test]
    fn test_ramping_profile() {
        let profile = LoadProfile::Ramping(Schedule::new(
            1,
            vec![Stage::secs(30, 3), Stage::secs(30, 0)],
        ));
        assert_eq!(profile.max_vus(), 3);
        assert_eq!(profile.planned_duration(), Duration::from_secs(60));
        assert_eq!(profile.executor_name(), "ramping-vus");
        assert_eq!(
            profile.describe(),
            "ramping-vus: 2 stages over 60s, up to 3 VUs (start 1)"
        );
    }

    #[test]
    fn test_shared_iterations_profile() {
        let profile = LoadProfile::SharedIterations {
            vus: 1,
            iterations: 5,
            max_duration: Duration::from_secs(600),
        };
        assert_eq!(profile.max_vus(), 1);
        assert_eq!(profile.planned_duration(), Duration::from_secs(600));
        assert!(profile.describe().contains("5 iterations across 1 VUs"));
    }

    #[test]
    fn test_profile_serializes_with_executor_tag() {
        let profile = LoadProfile::Constant {
            vus: 4,
            duration: Duration::from_secs(90),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["executor"], "constant-vus");
        assert_eq!(json["vus"], 4);
        assert_eq!(json["duration"], "1m 30s");
    }
}
