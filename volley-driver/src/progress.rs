//! Periodic progress reporting and abort-on-fail thresholds

use crate::metrics::RunMetrics;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use volley_core::Threshold;

pub struct ProgressReporter {
    pub metrics: Arc<RunMetrics>,
    /// Only thresholds marked `abort_on_fail` are checked here
    pub thresholds: Vec<Threshold>,
    pub interval: Duration,
    pub started: Instant,
    /// Cancelled when an abort threshold fails
    pub run_token: CancellationToken,
    pub aborted: Arc<AtomicBool>,
}

impl ProgressReporter {
    /// Runs until `stop` is cancelled
    pub fn spawn(self, stop: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(stop))
    }

    async fn run(self, stop: CancellationToken) {
        let mut ticker = interval_at(self.started + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let elapsed = self.started.elapsed();
            let snapshot = self.metrics.snapshot(elapsed);
            info!(
                vus = snapshot.vus,
                reqs = snapshot.http_reqs,
                failed_pct = snapshot.failure_rate() * 100.0,
                p95_ms = snapshot.http_req_duration.p95,
                "Progress at {}s",
                elapsed.as_secs()
            );

            let violated = self
                .thresholds
                .iter()
                .filter(|t| t.abort_eval_due(elapsed))
                .map(|t| t.evaluate(&snapshot))
                .find(|outcome| !outcome.passed);

            if let Some(outcome) = violated {
                warn!(
                    "Threshold {}: {} failed (observed {:.4}), aborting run",
                    outcome.metric, outcome.expression, outcome.observed
                );
                self.aborted.store(true, Ordering::SeqCst);
                self.run_token.cancel();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter(
        metrics: Arc<RunMetrics>,
        thresholds: Vec<Threshold>,
    ) -> (ProgressReporter, CancellationToken, Arc<AtomicBool>) {
        let run_token = CancellationToken::new();
        let aborted = Arc::new(AtomicBool::new(false));
        let reporter = ProgressReporter {
            metrics,
            thresholds,
            interval: Duration::from_secs(1),
            started: Instant::now(),
            run_token: run_token.clone(),
            aborted: aborted.clone(),
        };
        (reporter, run_token, aborted)
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_threshold_cancels_run() {
        let metrics = Arc::new(RunMetrics::new(&["status is 200"]).unwrap());
        metrics.record_response(500, Duration::from_millis(20), 10, 10, true);
        let threshold = Threshold::parse("http_req_failed", "rate<0.1")
            .unwrap()
            .with_abort(true, Some(Duration::from_secs(3)));

        let (reporter, run_token, aborted) = reporter(metrics, vec![threshold]);
        let handle = reporter.spawn(CancellationToken::new());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!run_token.is_cancelled(), "evaluation must wait for delay_abort_eval");

        handle.await.unwrap();
        assert!(run_token.is_cancelled());
        assert!(aborted.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_passing_thresholds_keep_running() {
        let metrics = Arc::new(RunMetrics::new(&["status is 200"]).unwrap());
        metrics.record_response(200, Duration::from_millis(20), 10, 10, false);
        let threshold = Threshold::parse("http_req_failed", "rate<0.1")
            .unwrap()
            .with_abort(true, None);

        let (reporter, run_token, aborted) = reporter(metrics, vec![threshold]);
        let stop = CancellationToken::new();
        let handle = reporter.spawn(stop.clone());

        tokio::time::sleep(Duration::from_secs(5)).await;
        stop.cancel();
        handle.await.unwrap();

        assert!(!run_token.is_cancelled());
        assert!(!aborted.load(Ordering::SeqCst));
    }
}
