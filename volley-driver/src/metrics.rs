//! Run-wide metric aggregation
//!
//! Every virtual user records into one shared [`RunMetrics`]. Counters are
//! atomics; distributions and histograms sit behind short `parking_lot`
//! locks. Individual iteration results are never retained.

use crate::error::{DriverError, DriverResult};
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tracing::warn;
use volley_core::contract::CheckOutcome;
use volley_core::{Aggregation, MetricName, MetricSource};

/// Histogram range: 1µs to 1h
const HISTOGRAM_MAX_MICROS: u64 = 3_600_000_000;
const HISTOGRAM_SIGFIG: u8 = 3;

struct CheckCounter {
    name: String,
    passes: AtomicU64,
    fails: AtomicU64,
}

pub struct RunMetrics {
    requests: AtomicU64,
    failed_requests: AtomicU64,
    iterations: AtomicU64,
    skipped_iterations: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    active_vus: AtomicU32,
    max_vus: AtomicU32,
    checks: Vec<CheckCounter>,
    status_codes: Mutex<BTreeMap<u16, u64>>,
    transport_errors: Mutex<BTreeMap<String, u64>>,
    request_duration: Mutex<Histogram<u64>>,
    iteration_duration: Mutex<Histogram<u64>>,
}

impl std::fmt::Debug for RunMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunMetrics")
            .field("requests", &self.requests.load(Ordering::Relaxed))
            .field("iterations", &self.iterations.load(Ordering::Relaxed))
            .field("active_vus", &self.active_vus.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn new_histogram() -> DriverResult<Histogram<u64>> {
    Histogram::new_with_bounds(1, HISTOGRAM_MAX_MICROS, HISTOGRAM_SIGFIG)
        .map_err(|e| DriverError::Histogram(e.to_string()))
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX).max(1)
}

impl RunMetrics {
    /// Creates empty metrics with one pass/fail counter per check name
    pub fn new(check_names: &[&str]) -> DriverResult<Self> {
        Ok(Self {
            requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            iterations: AtomicU64::new(0),
            skipped_iterations: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            active_vus: AtomicU32::new(0),
            max_vus: AtomicU32::new(0),
            checks: check_names
                .iter()
                .map(|name| CheckCounter {
                    name: name.to_string(),
                    passes: AtomicU64::new(0),
                    fails: AtomicU64::new(0),
                })
                .collect(),
            status_codes: Mutex::new(BTreeMap::new()),
            transport_errors: Mutex::new(BTreeMap::new()),
            request_duration: Mutex::new(new_histogram()?),
            iteration_duration: Mutex::new(new_histogram()?),
        })
    }

    /// A response arrived; `failed` when its status was not the expected one
    pub fn record_response(
        &self,
        status: u16,
        elapsed: Duration,
        sent: usize,
        received: usize,
        failed: bool,
    ) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes_sent.fetch_add(sent as u64, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(received as u64, Ordering::Relaxed);

        *self.status_codes.lock().entry(status).or_insert(0) += 1;
        self.request_duration.lock().saturating_record(micros(elapsed));
    }

    /// The request never produced a response
    pub fn record_transport_error(&self, kind: &str, sent: usize) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(sent as u64, Ordering::Relaxed);

        *self
            .transport_errors
            .lock()
            .entry(kind.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_checks(&self, outcomes: &[CheckOutcome<'_>]) {
        for outcome in outcomes {
            match self.checks.iter().find(|c| c.name == outcome.name) {
                Some(counter) if outcome.passed => {
                    counter.passes.fetch_add(1, Ordering::Relaxed);
                }
                Some(counter) => {
                    counter.fails.fetch_add(1, Ordering::Relaxed);
                }
                None => warn!("Unregistered check '{}' ignored", outcome.name),
            }
        }
    }

    pub fn record_iteration(&self, duration: Duration) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
        self.iteration_duration
            .lock()
            .saturating_record(micros(duration));
    }

    /// An iteration ran but had nothing to send
    pub fn record_skipped(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
        self.skipped_iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn vu_started(&self) {
        let active = self.active_vus.fetch_add(1, Ordering::Relaxed) + 1;
        self.max_vus.fetch_max(active, Ordering::Relaxed);
    }

    pub fn vu_stopped(&self) {
        self.active_vus.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn active_vus(&self) -> u32 {
        self.active_vus.load(Ordering::Relaxed)
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of everything recorded so far
    pub fn snapshot(&self, elapsed: Duration) -> MetricsSnapshot {
        let request_histogram = self.request_duration.lock().clone();
        let iteration_histogram = self.iteration_duration.lock().clone();

        MetricsSnapshot {
            elapsed,
            http_reqs: self.requests.load(Ordering::Relaxed),
            http_req_failed: self.failed_requests.load(Ordering::Relaxed),
            iterations: self.iterations.load(Ordering::Relaxed),
            skipped_iterations: self.skipped_iterations.load(Ordering::Relaxed),
            data_sent: self.bytes_sent.load(Ordering::Relaxed),
            data_received: self.bytes_received.load(Ordering::Relaxed),
            vus: self.active_vus.load(Ordering::Relaxed),
            vus_max: self.max_vus.load(Ordering::Relaxed),
            http_req_duration: TrendStats::from_histogram(&request_histogram),
            iteration_duration: TrendStats::from_histogram(&iteration_histogram),
            checks: self
                .checks
                .iter()
                .map(|c| CheckStats {
                    name: c.name.clone(),
                    passes: c.passes.load(Ordering::Relaxed),
                    fails: c.fails.load(Ordering::Relaxed),
                })
                .collect(),
            status_codes: self.status_codes.lock().clone(),
            transport_errors: self.transport_errors.lock().clone(),
            request_histogram,
            iteration_histogram,
        }
    }
}

/// Summary of a duration distribution, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrendStats {
    pub count: u64,
    pub avg: f64,
    pub min: f64,
    pub med: f64,
    pub max: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl TrendStats {
    fn from_histogram(histogram: &Histogram<u64>) -> Self {
        if histogram.len() == 0 {
            return Self::default();
        }
        Self {
            count: histogram.len(),
            avg: histogram.mean() / 1000.0,
            min: to_millis(histogram.min()),
            med: to_millis(histogram.value_at_quantile(0.5)),
            max: to_millis(histogram.max()),
            p90: to_millis(histogram.value_at_quantile(0.90)),
            p95: to_millis(histogram.value_at_quantile(0.95)),
            p99: to_millis(histogram.value_at_quantile(0.99)),
        }
    }
}

fn to_millis(micros: u64) -> f64 {
    micros as f64 / 1000.0
}

/// Pass/fail totals of one named check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckStats {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckStats {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    /// Fraction of passes, 0 when the check never ran
    pub fn pass_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.passes as f64 / total as f64,
        }
    }
}

/// Plain-data copy of [`RunMetrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub http_reqs: u64,
    pub http_req_failed: u64,
    pub iterations: u64,
    pub skipped_iterations: u64,
    pub data_sent: u64,
    pub data_received: u64,
    pub vus: u32,
    pub vus_max: u32,
    pub http_req_duration: TrendStats,
    pub iteration_duration: TrendStats,
    #[serde(skip)]
    pub checks: Vec<CheckStats>,
    pub status_codes: BTreeMap<u16, u64>,
    pub transport_errors: BTreeMap<String, u64>,
    #[serde(skip)]
    request_histogram: Histogram<u64>,
    #[serde(skip)]
    iteration_histogram: Histogram<u64>,
}

pub(crate) fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl MetricsSnapshot {
    /// Share of requests that failed, 0 without traffic
    pub fn failure_rate(&self) -> f64 {
        ratio(self.http_req_failed, self.http_reqs).unwrap_or(0.0)
    }

    /// Share of all check evaluations that passed
    pub fn checks_rate(&self) -> Option<f64> {
        let passes: u64 = self.checks.iter().map(|c| c.passes).sum();
        let total: u64 = self.checks.iter().map(CheckStats::total).sum();
        ratio(passes, total)
    }

    fn per_second(&self, count: u64) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            count as f64 / secs
        } else {
            0.0
        }
    }

    fn counter(&self, metric: MetricName) -> Option<u64> {
        match metric {
            MetricName::HttpReqs => Some(self.http_reqs),
            MetricName::Iterations => Some(self.iterations),
            MetricName::DataSent => Some(self.data_sent),
            MetricName::DataReceived => Some(self.data_received),
            _ => None,
        }
    }

    fn histogram(&self, metric: MetricName) -> Option<&Histogram<u64>> {
        match metric {
            MetricName::HttpReqDuration => Some(&self.request_histogram),
            MetricName::IterationDuration => Some(&self.iteration_histogram),
            _ => None,
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

impl MetricSource for MetricsSnapshot {
    fn value(&self, metric: MetricName, aggregation: Aggregation) -> Option<f64> {
        match metric {
            MetricName::HttpReqFailed => match aggregation {
                Aggregation::Rate => ratio(self.http_req_failed, self.http_reqs),
                _ => None,
            },
            MetricName::Checks => match aggregation {
                Aggregation::Rate => self.checks_rate(),
                _ => None,
            },
            MetricName::HttpReqDuration | MetricName::IterationDuration => {
                let histogram = self.histogram(metric)?;
                if histogram.len() == 0 {
                    return None;
                }
                let micros = match aggregation {
                    Aggregation::Avg => return Some(histogram.mean() / 1000.0),
                    Aggregation::Min => histogram.min(),
                    Aggregation::Max => histogram.max(),
                    Aggregation::Med => histogram.value_at_quantile(0.5),
                    Aggregation::Percentile(p) => histogram.value_at_quantile(p / 100.0),
                    Aggregation::Rate | Aggregation::Count => return None,
                };
                Some(to_millis(micros))
            }
            counter => {
                let count = self.counter(counter)?;
                match aggregation {
                    Aggregation::Count => Some(count as f64),
                    Aggregation::Rate => Some(self.per_second(count)),
                    _ => None,
                }
            }
        }
    }
}
