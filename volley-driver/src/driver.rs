//! Load driver: runs one plan against one endpoint

use crate::error::DriverResult;
use crate::executor::{execute, ExecutionEnd};
use crate::metrics::RunMetrics;
use crate::pool::{VuFactory, VuPool};
use crate::progress::ProgressReporter;
use crate::summary::{RunSummary, Verdict};
use crate::vu::IterationBudget;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;
use volley_core::{Endpoint, LoadProfile, PayloadSet, RunPlan};
use volley_http::InvocationClient;

pub struct LoadDriver {
    plan: RunPlan,
    endpoint: Arc<Endpoint>,
    client: Arc<dyn InvocationClient>,
    payloads: Option<PayloadSet>,
}

impl LoadDriver {
    pub fn new(plan: RunPlan, endpoint: Endpoint, client: Arc<dyn InvocationClient>) -> Self {
        Self {
            plan,
            endpoint: Arc::new(endpoint),
            client,
            payloads: None,
        }
    }

    /// Loads the endpoint's payload file; a failure leaves the set empty
    pub fn initialize(mut self) -> Self {
        let payloads = PayloadSet::load_or_empty(&self.endpoint.payload_file);
        if payloads.is_empty() {
            warn!(
                "No payloads for {}; iterations will not send requests",
                self.endpoint.name
            );
        } else {
            info!(
                "Loaded {} payloads from {}",
                payloads.len(),
                self.endpoint.payload_file.display()
            );
        }
        self.payloads = Some(payloads);
        self
    }

    /// Uses an already built payload set instead of the payload file
    pub fn with_payloads(mut self, payloads: PayloadSet) -> Self {
        self.payloads = Some(payloads);
        self
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Runs the plan to completion, or until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) -> DriverResult<RunSummary> {
        let driver = if self.payloads.is_some() {
            self
        } else {
            self.initialize()
        };
        let LoadDriver {
            plan,
            endpoint,
            client,
            payloads,
        } = driver;
        let payloads = payloads.unwrap_or_default();

        let metrics = Arc::new(RunMetrics::new(&endpoint.contract.check_names())?);
        let run_token = cancel.child_token();
        let aborted = Arc::new(AtomicBool::new(false));

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        info!(
            run_id = %run_id,
            tag = %plan.tag,
            "Starting run against {}: {}",
            endpoint.url,
            plan.profile.describe()
        );

        let progress_stop = CancellationToken::new();
        let progress = ProgressReporter {
            metrics: Arc::clone(&metrics),
            thresholds: plan
                .thresholds
                .iter()
                .filter(|t| t.abort_on_fail)
                .cloned()
                .collect(),
            interval: plan.progress_interval,
            started,
            run_token: run_token.clone(),
            aborted: Arc::clone(&aborted),
        }
        .spawn(progress_stop.clone());

        let budget = match plan.profile {
            LoadProfile::SharedIterations { iterations, .. } => {
                Some(Arc::new(IterationBudget::new(iterations)))
            }
            _ => None,
        };
        let factory = VuFactory {
            endpoint: Arc::clone(&endpoint),
            payloads: payloads.clone(),
            client,
            metrics: Arc::clone(&metrics),
            think_time: plan.think_time,
        };
        let mut pool = VuPool::new(factory, run_token.clone(), budget);

        let end = execute(&plan.profile, &mut pool, &run_token, plan.scheduler_tick).await;
        if end == ExecutionEnd::Cancelled {
            info!("Run cancelled, stopping virtual users");
        }
        let aborted_vus = pool.shutdown(plan.graceful_stop).await;

        progress_stop.cancel();
        if let Err(e) = progress.await {
            warn!("Progress task failed: {}", e);
        }

        let duration = started.elapsed();
        let snapshot = metrics.snapshot(duration);
        let thresholds: Vec<_> = plan.thresholds.iter().map(|t| t.evaluate(&snapshot)).collect();
        let aborted_by_threshold = aborted.load(Ordering::SeqCst);
        let verdict = Verdict::from_outcomes(&thresholds, aborted_by_threshold);

        info!(
            run_id = %run_id,
            reqs = snapshot.http_reqs,
            iterations = snapshot.iterations,
            "Run finished in {:.1}s: {}",
            duration.as_secs_f64(),
            verdict
        );

        Ok(RunSummary {
            run_id,
            tag: plan.tag.clone(),
            target: endpoint.name.clone(),
            url: endpoint.url.clone(),
            profile: plan.profile.describe(),
            started_at,
            finished_at: Utc::now(),
            duration,
            payloads: payloads.len(),
            interrupted: cancel.is_cancelled(),
            aborted_by_threshold,
            aborted_vus,
            checks: snapshot.checks.clone(),
            metrics: snapshot,
            thresholds,
            verdict,
        })
    }
}
