use anyhow::{Context, Result};
use colored::Colorize;
use std::time::Duration;
use volley_config::VolleyConfig;
use volley_core::{LoadProfile, RunPlan, Schedule};

use crate::report::outln;

/// Handle `volley plan`
pub fn handle_plan(mut config: VolleyConfig, preset: Option<String>, step: u64) -> Result<()> {
    if preset.is_some() {
        config.run.preset = preset;
    }
    let plan = RunPlan::resolve(&config.run).context("Failed to resolve run plan")?;
    print!("{}", render_plan(&plan, Duration::from_secs(step)));
    Ok(())
}

/// Text description of a plan: profile, stage table, sampled VU targets, thresholds
pub fn render_plan(plan: &RunPlan, step: Duration) -> String {
    let mut out = String::new();
    outln!(out, "{} {}", "Plan:".bold(), plan.tag.cyan());
    outln!(out, "  {}", plan.profile.describe());

    if let LoadProfile::Ramping(schedule) = &plan.profile {
        render_stages(&mut out, schedule);
        render_samples(&mut out, schedule, step);
    }

    if plan.thresholds.is_empty() {
        outln!(out, "\n{}", "No thresholds; the run always passes".yellow());
    } else {
        outln!(out, "\n{}", "Thresholds:".bold());
        for threshold in &plan.thresholds {
            let abort = if threshold.abort_on_fail {
                " (abort on fail)"
            } else {
                ""
            };
            outln!(out, "  {}: {}{}", threshold.metric, threshold.expression(), abort);
        }
    }
    out
}

fn render_stages(out: &mut String, schedule: &Schedule) {
    outln!(out, "\n{}", "Stages:".bold());
    outln!(out, "  {:>3}  {:>8}  {:>8}  {:>6}", "#", "duration", "ends at", "target");
    let mut ends_at = Duration::ZERO;
    for (index, stage) in schedule.stages.iter().enumerate() {
        ends_at += stage.duration;
        outln!(
            out,
            "  {:>3}  {:>7}s  {:>7}s  {:>6}",
            index + 1,
            stage.duration.as_secs(),
            ends_at.as_secs(),
            stage.target
        );
    }
}

fn render_samples(out: &mut String, schedule: &Schedule, step: Duration) {
    outln!(out, "\n{}", "VU targets:".bold());
    let total = schedule.total_duration();
    let mut at = Duration::ZERO;
    loop {
        outln!(out, "  t={:>5}s  {:>4} VUs", at.as_secs(), schedule.vus_at(at));
        if at >= total {
            break;
        }
        at = (at + step).min(total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volley_core::Preset;

    #[test]
    fn test_ramp_up_plan_lists_every_stage() {
        colored::control::set_override(false);
        let rendered = render_plan(&RunPlan::from_preset(Preset::RampUp), Duration::from_secs(30));

        assert!(rendered.contains("Plan: ramp-up"));
        assert!(rendered.contains("Stages:"));
        assert!(rendered.contains("http_req_failed: rate<0.02"));
        // Sampling ends exactly at the end of the schedule
        let last = rendered
            .lines()
            .filter(|l| l.trim_start().starts_with("t="))
            .last()
            .unwrap();
        assert!(last.contains("0 VUs"));
    }

    #[test]
    fn test_smoke_plan_has_no_stage_table() {
        colored::control::set_override(false);
        let rendered = render_plan(&RunPlan::from_preset(Preset::Smoke), Duration::from_secs(10));

        assert!(rendered.contains("shared-iterations: 5 iterations across 1 VUs"));
        assert!(!rendered.contains("Stages:"));
        assert!(rendered.contains("http_req_duration: p(95)<500"));
    }
}
