//! End-of-run summary

use crate::error::{DriverError, DriverResult};
use crate::metrics::{serialize_secs, CheckStats, MetricsSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;
use volley_core::ThresholdOutcome;

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
}

impl Verdict {
    pub fn from_outcomes(outcomes: &[ThresholdOutcome], aborted_by_threshold: bool) -> Self {
        if aborted_by_threshold || outcomes.iter().any(|o| !o.passed) {
            Verdict::Failed
        } else {
            Verdict::Passed
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Passed => f.write_str("passed"),
            Verdict::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub tag: String,
    pub target: String,
    pub url: String,
    pub profile: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub payloads: usize,
    /// Stopped from outside (e.g. Ctrl-C) before the profile ended
    pub interrupted: bool,
    pub aborted_by_threshold: bool,
    /// VUs still busy after the graceful stop; their iterations are lost
    pub aborted_vus: usize,
    pub metrics: MetricsSnapshot,
    pub checks: Vec<CheckStats>,
    pub thresholds: Vec<ThresholdOutcome>,
    pub verdict: Verdict,
}

impl RunSummary {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    pub fn to_json(&self) -> DriverResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the summary as pretty JSON to `path`
    pub fn export_json(&self, path: &Path) -> DriverResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| DriverError::Export {
            path: path.to_path_buf(),
            source,
        })
    }
}
