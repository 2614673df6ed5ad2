//! Virtual users

use crate::metrics::RunMetrics;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use volley_core::{Endpoint, PayloadSet};
use volley_http::{InvocationClient, InvocationRequest};

/// Iteration count shared by the virtual users of a shared-iterations run
#[derive(Debug)]
pub struct IterationBudget {
    remaining: AtomicU64,
}

impl IterationBudget {
    pub fn new(iterations: u64) -> Self {
        Self {
            remaining: AtomicU64::new(iterations),
        }
    }

    /// Takes one iteration from the budget, `false` once it is spent
    pub fn claim(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Acquire)
    }
}

/// What one iteration did
#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    /// The payload set was empty; nothing was sent
    Skipped,
    Completed(IterationResult),
}

/// Per-request outcome, already folded into the run metrics
#[derive(Debug, Clone, PartialEq)]
pub struct IterationResult {
    /// `None` when the request failed in transport
    pub status: Option<u16>,
    pub elapsed: Duration,
    pub failed: bool,
    pub checks_passed: usize,
    pub checks_failed: usize,
    /// Transport failure kind (`timeout`, `connect`, ...)
    pub error: Option<&'static str>,
}

/// One simulated client, looping request, check, think time
pub struct VirtualUser {
    id: u32,
    endpoint: Arc<Endpoint>,
    payloads: PayloadSet,
    client: Arc<dyn InvocationClient>,
    metrics: Arc<RunMetrics>,
    rng: StdRng,
    think_time: Duration,
    warned_empty: bool,
}

/// Keeps the active VU gauge right even when the task is aborted
struct ActiveGuard(Arc<RunMetrics>);

impl ActiveGuard {
    fn new(metrics: Arc<RunMetrics>) -> Self {
        metrics.vu_started();
        Self(metrics)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.vu_stopped();
    }
}

impl VirtualUser {
    pub fn new(
        id: u32,
        endpoint: Arc<Endpoint>,
        payloads: PayloadSet,
        client: Arc<dyn InvocationClient>,
        metrics: Arc<RunMetrics>,
        think_time: Duration,
    ) -> Self {
        Self {
            id,
            endpoint,
            payloads,
            client,
            metrics,
            rng: StdRng::from_rng(&mut rand::rng()),
            think_time,
            warned_empty: false,
        }
    }

    /// Replaces the random source, for reproducible payload selection
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Runs a single iteration: pick a payload, post it, check the response
    pub async fn iterate(&mut self) -> IterationOutcome {
        let started = Instant::now();

        let body = match self.payloads.choose(&mut self.rng) {
            Some(payload) => payload.body_bytes(),
            None => {
                if !self.warned_empty {
                    warn!(vu = self.id, "Payload set is empty, iterations send nothing");
                    self.warned_empty = true;
                }
                self.metrics.record_skipped();
                return IterationOutcome::Skipped;
            }
        };

        let sent = body.len();
        let contract = &self.endpoint.contract;
        let request = InvocationRequest::new(self.endpoint.url.clone(), body)
            .with_timeout(self.endpoint.request_timeout);

        let result = match self.client.send(request).await {
            Ok(response) => {
                let failed = response.status != contract.expected_status;
                self.metrics.record_response(
                    response.status,
                    response.elapsed,
                    sent,
                    response.body.len(),
                    failed,
                );
                let checks = contract.check(Some(response.status), &response.body);
                self.metrics.record_checks(&checks);
                let checks_passed = checks.iter().filter(|c| c.passed).count();

                IterationResult {
                    status: Some(response.status),
                    elapsed: response.elapsed,
                    failed,
                    checks_passed,
                    checks_failed: checks.len() - checks_passed,
                    error: None,
                }
            }
            Err(e) => {
                debug!(vu = self.id, "Request failed: {}", e);
                self.metrics.record_transport_error(e.kind(), sent);
                let checks = contract.check(None, &[]);
                self.metrics.record_checks(&checks);

                IterationResult {
                    status: None,
                    elapsed: started.elapsed(),
                    failed: true,
                    checks_passed: 0,
                    checks_failed: checks.len(),
                    error: Some(e.kind()),
                }
            }
        };

        self.metrics.record_iteration(started.elapsed());
        IterationOutcome::Completed(result)
    }

    /// Iterates until cancelled or until the shared budget is spent
    ///
    /// Cancellation is observed between iterations and during think time;
    /// a request already in flight completes. Returns the number of
    /// iterations run.
    pub async fn run_loop(
        mut self,
        cancel: CancellationToken,
        budget: Option<Arc<IterationBudget>>,
    ) -> u64 {
        let _active = ActiveGuard::new(Arc::clone(&self.metrics));
        let mut completed = 0;

        debug!(vu = self.id, "Virtual user started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            if let Some(ref budget) = budget {
                if !budget.claim() {
                    break;
                }
            }

            self.iterate().await;
            completed += 1;

            // Think time applies to skipped iterations too, so an empty set cannot spin
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.think_time) => {}
            }
        }
        debug!(vu = self.id, iterations = completed, "Virtual user stopped");

        completed
    }
}
