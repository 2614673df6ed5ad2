//! Pass/fail thresholds over aggregate run metrics
//!
//! A threshold pairs a metric with an expression such as `rate<0.05` or
//! `p(95)<500`. Expressions are parsed once when the plan is resolved and
//! evaluated against any [`MetricSource`], both during the run (for
//! `abort_on_fail` thresholds) and at the end.

use crate::error::ThresholdError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use volley_config::ThresholdConfig;

/// Metrics a run records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    HttpReqs,
    HttpReqFailed,
    HttpReqDuration,
    IterationDuration,
    Iterations,
    Checks,
    DataSent,
    DataReceived,
}

/// How a metric aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonic total
    Counter,
    /// Fraction of non-zero samples
    Rate,
    /// Distribution of durations in milliseconds
    Trend,
}

impl MetricName {
    pub const ALL: [MetricName; 8] = [
        MetricName::HttpReqs,
        MetricName::HttpReqFailed,
        MetricName::HttpReqDuration,
        MetricName::IterationDuration,
        MetricName::Iterations,
        MetricName::Checks,
        MetricName::DataSent,
        MetricName::DataReceived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::HttpReqs => "http_reqs",
            MetricName::HttpReqFailed => "http_req_failed",
            MetricName::HttpReqDuration => "http_req_duration",
            MetricName::IterationDuration => "iteration_duration",
            MetricName::Iterations => "iterations",
            MetricName::Checks => "checks",
            MetricName::DataSent => "data_sent",
            MetricName::DataReceived => "data_received",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricName::HttpReqs
            | MetricName::Iterations
            | MetricName::DataSent
            | MetricName::DataReceived => MetricKind::Counter,
            MetricName::HttpReqFailed | MetricName::Checks => MetricKind::Rate,
            MetricName::HttpReqDuration | MetricName::IterationDuration => MetricKind::Trend,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ThresholdError::UnknownMetric(s.to_string()))
    }
}

impl MetricKind {
    fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Rate => "rate",
            MetricKind::Trend => "trend",
        }
    }

    fn supports(&self, aggregation: Aggregation) -> bool {
        match self {
            MetricKind::Counter => matches!(aggregation, Aggregation::Count | Aggregation::Rate),
            MetricKind::Rate => matches!(aggregation, Aggregation::Rate),
            MetricKind::Trend => matches!(
                aggregation,
                Aggregation::Avg
                    | Aggregation::Min
                    | Aggregation::Max
                    | Aggregation::Med
                    | Aggregation::Percentile(_)
            ),
        }
    }
}

/// Aggregate a threshold compares against
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    Rate,
    Count,
    Avg,
    Min,
    Max,
    Med,
    Percentile(f64),
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Rate => f.write_str("rate"),
            Aggregation::Count => f.write_str("count"),
            Aggregation::Avg => f.write_str("avg"),
            Aggregation::Min => f.write_str("min"),
            Aggregation::Max => f.write_str("max"),
            Aggregation::Med => f.write_str("med"),
            Aggregation::Percentile(p) => write!(f, "p({})", p),
        }
    }
}

impl Aggregation {
    fn parse(text: &str, expression: &str) -> Result<Self, ThresholdError> {
        let aggregation = match text {
            "rate" => Aggregation::Rate,
            "count" => Aggregation::Count,
            "avg" => Aggregation::Avg,
            "min" => Aggregation::Min,
            "max" => Aggregation::Max,
            "med" => Aggregation::Med,
            other => {
                let inner = other
                    .strip_prefix("p(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .ok_or_else(|| syntax(expression, format!("unknown aggregation '{}'", other)))?;
                let percentile: f64 = inner
                    .parse()
                    .map_err(|_| syntax(expression, format!("invalid percentile '{}'", inner)))?;
                if !(percentile > 0.0 && percentile <= 100.0) {
                    return Err(syntax(expression, "percentile must be in (0, 100]"));
                }
                Aggregation::Percentile(percentile)
            }
        };
        Ok(aggregation)
    }
}

/// Comparison operator of a threshold expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    // Two-character operators first so `<=` is not read as `<`
    const OPERATORS: [(&'static str, Comparison); 6] = [
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("==", Comparison::Eq),
        ("!=", Comparison::Ne),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }

    pub fn holds(&self, observed: f64, limit: f64) -> bool {
        match self {
            Comparison::Lt => observed < limit,
            Comparison::Le => observed <= limit,
            Comparison::Gt => observed > limit,
            Comparison::Ge => observed >= limit,
            Comparison::Eq => observed == limit,
            Comparison::Ne => observed != limit,
        }
    }
}

/// Read access to aggregated metrics
pub trait MetricSource {
    /// Current value of `aggregation` over `metric`, `None` if no data was recorded
    fn value(&self, metric: MetricName, aggregation: Aggregation) -> Option<f64>;
}

/// A parsed threshold
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub metric: MetricName,
    pub aggregation: Aggregation,
    pub comparison: Comparison,
    pub limit: f64,
    pub abort_on_fail: bool,
    pub delay_abort_eval: Option<Duration>,
}

/// Result of evaluating one threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdOutcome {
    pub metric: MetricName,
    pub expression: String,
    pub observed: f64,
    pub passed: bool,
}

impl Threshold {
    pub fn new(
        metric: MetricName,
        aggregation: Aggregation,
        comparison: Comparison,
        limit: f64,
    ) -> Self {
        Self {
            metric,
            aggregation,
            comparison,
            limit,
            abort_on_fail: false,
            delay_abort_eval: None,
        }
    }

    /// Parse `expression` (e.g. `p(95) < 500`) for the metric named `metric`
    pub fn parse(metric: &str, expression: &str) -> Result<Self, ThresholdError> {
        let metric: MetricName = metric.parse()?;
        let compact: String = expression.chars().filter(|c| !c.is_whitespace()).collect();

        let (position, text, comparison) = Comparison::OPERATORS
            .iter()
            .filter_map(|(text, op)| compact.find(text).map(|pos| (pos, *text, *op)))
            .min_by_key(|(pos, text, _)| (*pos, std::cmp::Reverse(text.len())))
            .ok_or_else(|| syntax(expression, "missing comparison operator"))?;

        let lhs = &compact[..position];
        let rhs = &compact[position + text.len()..];
        if lhs.is_empty() {
            return Err(syntax(expression, "missing aggregation"));
        }

        let aggregation = Aggregation::parse(lhs, expression)?;
        let limit: f64 = rhs
            .parse()
            .map_err(|_| syntax(expression, format!("invalid number '{}'", rhs)))?;
        if !limit.is_finite() {
            return Err(syntax(expression, "limit must be a finite number"));
        }

        let kind = metric.kind();
        if !kind.supports(aggregation) {
            return Err(ThresholdError::Aggregation {
                metric: metric.as_str().to_string(),
                kind: kind.as_str(),
                aggregation: aggregation.to_string(),
            });
        }

        Ok(Self::new(metric, aggregation, comparison, limit))
    }

    pub fn with_abort(mut self, abort_on_fail: bool, delay_abort_eval: Option<Duration>) -> Self {
        self.abort_on_fail = abort_on_fail;
        self.delay_abort_eval = delay_abort_eval;
        self
    }

    /// Canonical expression text, e.g. `p(95)<500`
    pub fn expression(&self) -> String {
        format!("{}{}{}", self.aggregation, self.comparison.as_str(), self.limit)
    }

    /// Whether an abort-on-fail threshold may be checked at `elapsed`
    pub fn abort_eval_due(&self, elapsed: Duration) -> bool {
        self.abort_on_fail && self.delay_abort_eval.is_none_or(|delay| elapsed >= delay)
    }

    pub fn evaluate(&self, source: &dyn MetricSource) -> ThresholdOutcome {
        let observed = source.value(self.metric, self.aggregation).unwrap_or(0.0);
        ThresholdOutcome {
            metric: self.metric,
            expression: self.expression(),
            observed,
            passed: self.comparison.holds(observed, self.limit),
        }
    }
}

impl Serialize for Threshold {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Threshold", 3)?;
        state.serialize_field("metric", &self.metric)?;
        state.serialize_field("expression", &self.expression())?;
        state.serialize_field("abort_on_fail", &self.abort_on_fail)?;
        state.end()
    }
}

/// Parse the `thresholds` map of a run configuration
pub fn thresholds_from_config(
    config: &BTreeMap<String, Vec<ThresholdConfig>>,
) -> Result<Vec<Threshold>, ThresholdError> {
    let mut thresholds = Vec::new();
    for (metric, entries) in config {
        for entry in entries {
            let threshold = Threshold::parse(metric, entry.expression())?
                .with_abort(entry.abort_on_fail(), entry.delay_abort_eval());
            thresholds.push(threshold);
        }
    }
    Ok(thresholds)
}

fn syntax(expression: &str, reason: impl Into<String>) -> ThresholdError {
    ThresholdError::Syntax {
        expression: expression.to_string(),
        reason: reason.into(),
    }
}
