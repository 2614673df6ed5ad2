//! Run plan resolution

use crate::error::{CoreError, CoreResult};
use crate::preset::Preset;
use crate::profile::LoadProfile;
use crate::stage::{Schedule, Stage};
use crate::threshold::{thresholds_from_config, Threshold};
use serde::Serialize;
use std::time::Duration;
use volley_config::RunConfig;

/// Default population before the first stage
pub const DEFAULT_START_VUS: u32 = 1;

/// Everything the driver needs to know about traffic shape and pass criteria
#[derive(Debug, Clone, Serialize)]
pub struct RunPlan {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,
    pub profile: LoadProfile,
    pub thresholds: Vec<Threshold>,
    #[serde(with = "humantime_serde")]
    pub think_time: Duration,
    #[serde(with = "humantime_serde")]
    pub graceful_stop: Duration,
    #[serde(with = "humantime_serde")]
    pub progress_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub scheduler_tick: Duration,
}

impl RunPlan {
    /// A preset with default timings
    pub fn from_preset(preset: Preset) -> Self {
        let defaults = RunConfig::default();
        Self {
            tag: preset.name().to_string(),
            preset: Some(preset),
            profile: preset.profile(),
            thresholds: preset.thresholds(),
            think_time: defaults.think_time,
            graceful_stop: defaults.graceful_stop,
            progress_interval: defaults.progress_interval,
            scheduler_tick: defaults.scheduler_tick,
        }
    }

    /// Builds the plan for a run configuration
    ///
    /// Starts from the preset, if any. Explicit stages, `iterations` or
    /// `duration` replace the preset's profile, explicit thresholds replace
    /// its thresholds, and an explicit tag replaces its name.
    pub fn resolve(config: &RunConfig) -> CoreResult<Self> {
        let preset = config
            .preset
            .as_deref()
            .map(str::parse::<Preset>)
            .transpose()?;

        let profile = Self::resolve_profile(config, preset)?;

        let thresholds = match config.thresholds {
            Some(ref map) => thresholds_from_config(map)?,
            None => preset.map(|p| p.thresholds()).unwrap_or_default(),
        };

        let tag = config
            .tag
            .clone()
            .or_else(|| preset.map(|p| p.name().to_string()))
            .unwrap_or_else(|| "custom".to_string());

        Ok(Self {
            tag,
            preset,
            profile,
            thresholds,
            think_time: config.think_time,
            graceful_stop: config.graceful_stop,
            progress_interval: config.progress_interval,
            scheduler_tick: config.scheduler_tick,
        })
    }

    fn resolve_profile(config: &RunConfig, preset: Option<Preset>) -> CoreResult<LoadProfile> {
        if let Some(ref stages) = config.stages {
            let stages = stages.iter().map(Stage::from).collect();
            let start_vus = config.start_vus.unwrap_or(DEFAULT_START_VUS);
            return Ok(LoadProfile::Ramping(Schedule::new(start_vus, stages)));
        }

        if let Some(iterations) = config.iterations {
            return Ok(LoadProfile::SharedIterations {
                vus: config.vus.unwrap_or(1),
                iterations,
                max_duration: config.duration.unwrap_or(config.max_duration),
            });
        }

        if let Some(duration) = config.duration {
            return Ok(LoadProfile::Constant {
                vus: config.vus.unwrap_or(1),
                duration,
            });
        }

        match (preset.map(|p| p.profile()), config.vus) {
            (Some(LoadProfile::SharedIterations { vus, iterations, .. }), override_vus) => {
                Ok(LoadProfile::SharedIterations {
                    vus: override_vus.unwrap_or(vus),
                    iterations,
                    max_duration: config.max_duration,
                })
            }
            (Some(LoadProfile::Constant { vus, duration }), override_vus) => {
                Ok(LoadProfile::Constant {
                    vus: override_vus.unwrap_or(vus),
                    duration,
                })
            }
            (Some(LoadProfile::Ramping(_)), Some(_)) => Err(CoreError::Plan(
                "vus cannot override a ramping preset, set stages instead".to_string(),
            )),
            (Some(profile), None) => Ok(profile),
            (None, Some(_)) => Err(CoreError::Plan(
                "vus needs either iterations or duration".to_string(),
            )),
            (None, None) => Err(CoreError::Plan(
                "no load profile: set run.preset, run.stages, run.iterations or run.duration"
                    .to_string(),
            )),
        }
    }

    /// Thresholds that are evaluated continuously and may stop the run
    pub fn has_abort_thresholds(&self) -> bool {
        self.thresholds.iter().any(|t| t.abort_on_fail)
    }
}
