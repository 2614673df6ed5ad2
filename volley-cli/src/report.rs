//! Text report printed at the end of `volley run`

use colored::Colorize;
use volley_driver::{RunSummary, TrendStats, Verdict};

/// `writeln!` for a `String` buffer, where writing cannot fail
macro_rules! outln {
    ($out:expr) => {
        $out.push('\n')
    };
    ($out:expr, $($arg:tt)*) => {{
        $out.push_str(&format!($($arg)*));
        $out.push('\n');
    }};
}
pub(crate) use outln;

fn mark(passed: bool) -> colored::ColoredString {
    if passed {
        "✓".bright_green().bold()
    } else {
        "✗".bright_red().bold()
    }
}

fn per_second(count: u64, secs: f64) -> f64 {
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

fn trend(stats: &TrendStats) -> String {
    format!(
        "avg={:.2}ms min={:.2}ms med={:.2}ms max={:.2}ms p(90)={:.2}ms p(95)={:.2}ms",
        stats.avg, stats.min, stats.med, stats.max, stats.p90, stats.p95
    )
}

fn bytes(count: u64) -> String {
    match count {
        n if n >= 1 << 20 => format!("{:.1} MB", n as f64 / (1u64 << 20) as f64),
        n if n >= 1 << 10 => format!("{:.1} kB", n as f64 / (1u64 << 10) as f64),
        n => format!("{} B", n),
    }
}

/// Human-readable end-of-run report
pub fn render_summary(summary: &RunSummary) -> String {
    let metrics = &summary.metrics;
    let secs = summary.duration.as_secs_f64();
    let mut out = String::new();

    outln!(
        out,
        "\n{} {} {} {}",
        "run".bold(),
        summary.tag.cyan(),
        "against".bold(),
        summary.target.cyan()
    );
    outln!(out, "  url:      {}", summary.url);
    outln!(out, "  profile:  {}", summary.profile);
    outln!(
        out,
        "  started:  {}  duration: {:.1}s  payloads: {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        secs,
        summary.payloads
    );
    if summary.interrupted {
        outln!(out, "  {}", "interrupted before the profile finished".yellow());
    }
    if summary.aborted_by_threshold {
        outln!(out, "  {}", "aborted by a failing threshold".red());
    }
    if summary.aborted_vus > 0 {
        outln!(
            out,
            "  {} VUs were still busy after the graceful stop",
            summary.aborted_vus
        );
    }

    if !summary.checks.is_empty() {
        outln!(out);
        for check in &summary.checks {
            outln!(
                out,
                "  {} {}  {}/{} ({:.2}%)",
                mark(check.fails == 0 && check.total() > 0),
                check.name,
                check.passes,
                check.total(),
                check.pass_rate() * 100.0
            );
        }
    }

    outln!(out);
    outln!(
        out,
        "  http_reqs..........: {}  {:.2}/s",
        metrics.http_reqs,
        per_second(metrics.http_reqs, secs)
    );
    outln!(
        out,
        "  http_req_failed....: {:.2}%  {} of {}",
        metrics.failure_rate() * 100.0,
        metrics.http_req_failed,
        metrics.http_reqs
    );
    outln!(
        out,
        "  http_req_duration..: {}",
        trend(&metrics.http_req_duration)
    );
    outln!(
        out,
        "  iterations.........: {}  skipped: {}",
        metrics.iterations, metrics.skipped_iterations
    );
    outln!(
        out,
        "  iteration_duration.: {}",
        trend(&metrics.iteration_duration)
    );
    outln!(out, "  vus_max............: {}", metrics.vus_max);
    outln!(
        out,
        "  data...............: {} sent, {} received",
        bytes(metrics.data_sent),
        bytes(metrics.data_received)
    );
    if !metrics.transport_errors.is_empty() {
        let errors: Vec<String> = metrics
            .transport_errors
            .iter()
            .map(|(kind, count)| format!("{}={}", kind, count))
            .collect();
        outln!(out, "  transport_errors...: {}", errors.join(" "));
    }

    if !summary.thresholds.is_empty() {
        outln!(out, "\n  {}", "thresholds".bold());
        for outcome in &summary.thresholds {
            outln!(
                out,
                "  {} {} {}  (observed {:.4})",
                mark(outcome.passed),
                outcome.metric,
                outcome.expression,
                outcome.observed
            );
        }
    }

    let verdict = match summary.verdict {
        Verdict::Passed => "PASSED".bright_green().bold(),
        Verdict::Failed => "FAILED".bright_red().bold(),
    };
    outln!(out, "\n  verdict: {}", verdict);
    out
}
