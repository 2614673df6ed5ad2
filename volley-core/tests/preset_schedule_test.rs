//! Presets resolved through the public API, sampled the way the scheduler does

use std::time::Duration;
use volley_config::{ConfigLoader, RunConfig};
use volley_core::{LoadProfile, MetricName, Preset, RunPlan};

fn schedule_of(preset: Preset) -> volley_core::Schedule {
    match RunPlan::from_preset(preset).profile {
        LoadProfile::Ramping(schedule) => schedule,
        other => panic!("{} is not ramping: {:?}", preset, other),
    }
}

#[test]
fn test_burst_spike_peaks() {
    let schedule = schedule_of(Preset::BurstSpike);

    // 30s + 1m + 30s, then a 10s spike to 20
    assert_eq!(schedule.vus_at(Duration::from_secs(120)), 5);
    assert_eq!(schedule.vus_at(Duration::from_secs(130)), 20);
    // 1m back down to 5, then a 10s spike to 25
    assert_eq!(schedule.vus_at(Duration::from_secs(190)), 5);
    assert_eq!(schedule.vus_at(Duration::from_secs(200)), 25);
    assert_eq!(schedule.vus_at(Duration::from_secs(230)), 0);
}

#[test]
fn test_schedule_never_exceeds_max_target() {
    for preset in [Preset::RampUp, Preset::BurstSpike, Preset::RealisticSoak] {
        let schedule = schedule_of(preset);
        let max = schedule.max_target();
        let end = schedule.total_duration().as_secs();
        for second in 0..=end {
            assert!(schedule.vus_at(Duration::from_secs(second)) <= max);
        }
        assert_eq!(schedule.vus_at(schedule.total_duration()), 0);
    }
}

#[test]
fn test_plan_from_yaml_config() {
    let yaml = r#"
run:
  preset: ramp-up
  tag: ramp-up-logreg
  think_time: 500ms
  thresholds:
    http_req_failed:
      - threshold: rate<0.02
        abort_on_fail: true
        delay_abort_eval: 30s
    http_req_duration:
      - p(95)<800
"#;
    // Private prefix keeps VOLLEY_* variables in the environment out of this test
    let config = ConfigLoader::with_prefix("VOLLEY_CORE_TEST")
        .from_yaml_str(yaml)
        .unwrap();
    let plan = RunPlan::resolve(&config.run).unwrap();

    assert_eq!(plan.tag, "ramp-up-logreg");
    assert_eq!(plan.think_time, Duration::from_millis(500));
    assert_eq!(plan.profile.planned_duration(), Duration::from_secs(300));
    assert_eq!(plan.thresholds.len(), 2);

    let abort = plan
        .thresholds
        .iter()
        .find(|t| t.metric == MetricName::HttpReqFailed)
        .unwrap();
    assert!(abort.abort_on_fail);
    assert!(!abort.abort_eval_due(Duration::from_secs(10)));
}

#[test]
fn test_plan_requires_a_profile() {
    assert!(RunPlan::resolve(&RunConfig::default()).is_err());
}
