//! Executors: drive the VU pool according to a load profile

use crate::pool::VuPool;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use volley_core::{LoadProfile, Schedule};

/// How an executor finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionEnd {
    /// The profile ran to its planned end
    Completed,
    /// The run token was cancelled first
    Cancelled,
    /// An iteration budget was still left at `max_duration`
    TimedOut,
}

/// Runs `profile` on `pool` until it ends or `cancel` fires
///
/// VUs are left running; the caller shuts the pool down afterwards.
pub async fn execute(
    profile: &LoadProfile,
    pool: &mut VuPool,
    cancel: &CancellationToken,
    scheduler_tick: Duration,
) -> ExecutionEnd {
    match profile {
        LoadProfile::Ramping(schedule) => ramping(schedule, pool, cancel, scheduler_tick).await,
        LoadProfile::Constant { vus, duration } => constant(*vus, *duration, pool, cancel).await,
        LoadProfile::SharedIterations {
            vus, max_duration, ..
        } => shared_iterations(*vus, *max_duration, pool, cancel).await,
    }
}

async fn ramping(
    schedule: &Schedule,
    pool: &mut VuPool,
    cancel: &CancellationToken,
    tick: Duration,
) -> ExecutionEnd {
    let started = Instant::now();
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stage = None;

    loop {
        let elapsed = started.elapsed();
        if schedule.is_finished(elapsed) {
            return ExecutionEnd::Completed;
        }

        let current = schedule.stage_index_at(elapsed);
        if current != stage {
            if let Some(index) = current {
                let next = &schedule.stages[index];
                info!(
                    "Stage {}/{}: {} VUs over {}s",
                    index + 1,
                    schedule.stages.len(),
                    next.target,
                    next.duration.as_secs()
                );
            }
            stage = current;
        }

        pool.scale_to(schedule.vus_at(elapsed) as usize);

        tokio::select! {
            _ = cancel.cancelled() => return ExecutionEnd::Cancelled,
            _ = ticker.tick() => {}
        }
    }
}

async fn constant(
    vus: u32,
    duration: Duration,
    pool: &mut VuPool,
    cancel: &CancellationToken,
) -> ExecutionEnd {
    pool.scale_to(vus as usize);

    tokio::select! {
        _ = cancel.cancelled() => ExecutionEnd::Cancelled,
        _ = tokio::time::sleep(duration) => ExecutionEnd::Completed,
    }
}

async fn shared_iterations(
    vus: u32,
    max_duration: Duration,
    pool: &mut VuPool,
    cancel: &CancellationToken,
) -> ExecutionEnd {
    pool.scale_to(vus as usize);

    tokio::select! {
        _ = cancel.cancelled() => ExecutionEnd::Cancelled,
        _ = pool.wait_all() => {
            debug!("Iteration budget spent");
            ExecutionEnd::Completed
        }
        _ = tokio::time::sleep(max_duration) => {
            info!("max_duration of {}s reached before all iterations ran", max_duration.as_secs());
            ExecutionEnd::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RunMetrics;
    use crate::pool::VuFactory;
    use crate::testing::{endpoint, FakeClient};
    use crate::vu::IterationBudget;
    use serde_json::json;
    use std::sync::Arc;
    use volley_core::{PayloadSet, ResponseContract, Stage};

    struct Harness {
        pool: VuPool,
        metrics: Arc<RunMetrics>,
        client: Arc<FakeClient>,
        token: CancellationToken,
    }

    fn harness(budget: Option<u64>, think_time: Duration) -> Harness {
        let contract = ResponseContract::status_only();
        let metrics = Arc::new(RunMetrics::new(&contract.check_names()).unwrap());
        let client = Arc::new(FakeClient::ok("{}"));
        let factory = VuFactory {
            endpoint: Arc::new(endpoint(contract)),
            payloads: PayloadSet::from_values(vec![json!({"features": [0.5]})]).unwrap(),
            client: client.clone(),
            metrics: metrics.clone(),
            think_time,
        };
        let token = CancellationToken::new();
        let budget = budget.map(|n| Arc::new(IterationBudget::new(n)));
        Harness {
            pool: VuPool::new(factory, token.clone(), budget),
            metrics,
            client,
            token,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_iterations_sends_exactly_the_budget() {
        let mut h = harness(Some(5), Duration::from_secs(1));
        let profile = LoadProfile::SharedIterations {
            vus: 1,
            iterations: 5,
            max_duration: Duration::from_secs(600),
        };

        let end = execute(&profile, &mut h.pool, &h.token, Duration::from_millis(250)).await;

        assert_eq!(end, ExecutionEnd::Completed);
        assert_eq!(h.client.calls(), 5);
        assert_eq!(h.metrics.snapshot(Duration::from_secs(6)).iterations, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_iterations_stop_at_max_duration() {
        let mut h = harness(Some(1_000), Duration::from_secs(1));
        let profile = LoadProfile::SharedIterations {
            vus: 2,
            iterations: 1_000,
            max_duration: Duration::from_secs(3),
        };

        let end = execute(&profile, &mut h.pool, &h.token, Duration::from_millis(250)).await;
        assert_eq!(end, ExecutionEnd::TimedOut);
        assert_eq!(h.pool.shutdown(Duration::from_secs(30)).await, 0);
        assert!(h.client.calls() < 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ramping_follows_schedule() {
        let mut h = harness(None, Duration::from_secs(1));
        let schedule = Schedule::new(0, vec![Stage::secs(10, 4), Stage::secs(10, 4), Stage::secs(10, 0)]);
        let profile = LoadProfile::Ramping(schedule);

        let metrics = h.metrics.clone();
        let observer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(15)).await;
            metrics.active_vus()
        });

        let end = execute(&profile, &mut h.pool, &h.token, Duration::from_millis(250)).await;

        assert_eq!(end, ExecutionEnd::Completed);
        assert_eq!(observer.await.unwrap(), 4);
        assert_eq!(h.pool.active(), 0);
        assert_eq!(h.metrics.snapshot(Duration::from_secs(30)).vus_max, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_constant_runs_for_duration_and_honours_cancel() {
        let mut h = harness(None, Duration::from_secs(1));
        let profile = LoadProfile::Constant {
            vus: 3,
            duration: Duration::from_secs(60),
        };

        let token = h.token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            token.cancel();
        });

        let started = Instant::now();
        let end = execute(&profile, &mut h.pool, &h.token, Duration::from_millis(250)).await;

        assert_eq!(end, ExecutionEnd::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(6));
        assert_eq!(h.pool.active(), 3);
        h.pool.shutdown(Duration::from_secs(30)).await;
        assert_eq!(h.metrics.active_vus(), 0);
    }
}
