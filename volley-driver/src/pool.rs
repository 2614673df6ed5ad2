//! Pool of running virtual users

use crate::metrics::RunMetrics;
use crate::vu::{IterationBudget, VirtualUser};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use volley_core::{Endpoint, PayloadSet};
use volley_http::InvocationClient;

/// Everything a new virtual user shares with the rest of the run
#[derive(Clone)]
pub struct VuFactory {
    pub endpoint: Arc<Endpoint>,
    pub payloads: PayloadSet,
    pub client: Arc<dyn InvocationClient>,
    pub metrics: Arc<RunMetrics>,
    pub think_time: Duration,
}

impl VuFactory {
    fn build(&self, id: u32) -> VirtualUser {
        VirtualUser::new(
            id,
            Arc::clone(&self.endpoint),
            self.payloads.clone(),
            Arc::clone(&self.client),
            Arc::clone(&self.metrics),
            self.think_time,
        )
    }
}

/// Spawns, retires and finally drains virtual user tasks
///
/// Each VU runs under a child of the run token, so cancelling the run stops
/// every VU while retiring one only stops that VU.
pub struct VuPool {
    factory: VuFactory,
    run_token: CancellationToken,
    budget: Option<Arc<IterationBudget>>,
    tasks: JoinSet<u64>,
    /// Tokens of VUs not yet retired, oldest first
    live: Vec<(u32, CancellationToken)>,
    next_id: u32,
}

impl VuPool {
    pub fn new(
        factory: VuFactory,
        run_token: CancellationToken,
        budget: Option<Arc<IterationBudget>>,
    ) -> Self {
        Self {
            factory,
            run_token,
            budget,
            tasks: JoinSet::new(),
            live: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of VUs that have not been asked to stop
    pub fn active(&self) -> usize {
        self.live.len()
    }

    /// Spawns or retires VUs until `target` are live; the newest retire first
    pub fn scale_to(&mut self, target: usize) {
        self.reap();

        if self.live.len() != target {
            debug!("Scaling virtual users {} -> {}", self.live.len(), target);
        }

        while self.live.len() < target {
            let id = self.next_id;
            self.next_id += 1;

            let token = self.run_token.child_token();
            let vu = self.factory.build(id);
            self.tasks
                .spawn(vu.run_loop(token.clone(), self.budget.clone()));
            self.live.push((id, token));
        }

        while self.live.len() > target {
            if let Some((id, token)) = self.live.pop() {
                debug!(vu = id, "Retiring virtual user");
                token.cancel();
            }
        }
    }

    /// Waits until every VU task has exited on its own
    pub async fn wait_all(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            log_join(result);
        }
        self.live.clear();
    }

    /// Stops every VU, giving in-flight iterations up to `graceful_stop`
    ///
    /// Returns how many VUs had to be aborted.
    pub async fn shutdown(mut self, graceful_stop: Duration) -> usize {
        for (_, token) in self.live.drain(..) {
            token.cancel();
        }

        let drained = tokio::time::timeout(graceful_stop, async {
            while let Some(result) = self.tasks.join_next().await {
                log_join(result);
            }
        })
        .await;

        if drained.is_ok() {
            return 0;
        }

        let stragglers = self.tasks.len();
        warn!(
            "{} virtual users still busy after graceful stop of {}s, aborting",
            stragglers,
            graceful_stop.as_secs()
        );
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        stragglers
    }

    /// Collects tasks that already finished without waiting
    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_join(result);
        }
    }
}

fn log_join(result: Result<u64, tokio::task::JoinError>) {
    match result {
        Ok(_) => {}
        Err(e) if e.is_cancelled() => {}
        Err(e) => error!("Virtual user task failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{endpoint, FakeClient};
    use serde_json::json;
    use volley_core::ResponseContract;

    fn pool(client: Arc<FakeClient>, think_time: Duration) -> (VuPool, Arc<RunMetrics>, CancellationToken) {
        let contract = ResponseContract::status_only();
        let metrics = Arc::new(RunMetrics::new(&contract.check_names()).unwrap());
        let factory = VuFactory {
            endpoint: Arc::new(endpoint(contract)),
            payloads: PayloadSet::from_values(vec![json!({"text": "hello"})]).unwrap(),
            client,
            metrics: metrics.clone(),
            think_time,
        };
        let token = CancellationToken::new();
        (VuPool::new(factory, token.clone(), None), metrics, token)
    }

    #[tokio::test(start_paused = true)]
    async fn test_scale_up_and_down() {
        let (mut pool, metrics, _token) = pool(Arc::new(FakeClient::ok("{}")), Duration::from_secs(1));

        pool.scale_to(5);
        assert_eq!(pool.active(), 5);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(metrics.active_vus(), 5);

        pool.scale_to(2);
        assert_eq!(pool.active(), 2);
        // Retired VUs leave once their in-flight request completes
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(metrics.active_vus(), 2);

        assert_eq!(pool.shutdown(Duration::from_secs(30)).await, 0);
        assert_eq!(metrics.active_vus(), 0);
        assert_eq!(metrics.snapshot(Duration::from_secs(1)).vus_max, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_token_stops_all() {
        let (mut pool, metrics, token) = pool(Arc::new(FakeClient::ok("{}")), Duration::from_secs(1));
        pool.scale_to(3);
        tokio::time::sleep(Duration::from_millis(500)).await;

        token.cancel();
        pool.wait_all().await;
        assert_eq!(metrics.active_vus(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_lets_in_flight_requests_finish() {
        let client = Arc::new(FakeClient::ok("{}"));
        let (mut pool, metrics, _token) = pool(client.clone(), Duration::ZERO);
        pool.scale_to(2);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let aborted = pool.shutdown(Duration::from_secs(5)).await;

        assert_eq!(aborted, 0);
        let snapshot = metrics.snapshot(Duration::from_secs(1));
        // Both first requests were in flight at shutdown and completed
        assert_eq!(snapshot.http_reqs, 2);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_after_grace_period() {
        let client = Arc::new(FakeClient::ok("{}"));
        let (mut pool, metrics, _token) = pool(client, Duration::ZERO);
        pool.scale_to(3);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Requests take 100ms, the grace period is shorter
        let aborted = pool.shutdown(Duration::from_millis(10)).await;

        assert_eq!(aborted, 3);
        assert_eq!(metrics.active_vus(), 0);
        assert_eq!(metrics.snapshot(Duration::from_secs(1)).http_reqs, 0);
    }
}
