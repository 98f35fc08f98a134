use super::progress::{ProgressEvent, ProgressSink};
use super::{EvaluationReport, ItemOutcome};
use crate::aggregate::ScoreDistribution;
use std::fmt::Write as _;
use std::sync::Arc;

#[must_use]
pub fn format_progress_line(done: usize, total: usize) -> String {
    format!("Evaluating {}/{}...", done, total)
}

/// At most ~10 updates per run, plus the final one.
pub(crate) fn progress_step(total: usize) -> usize {
    if total <= 10 {
        1
    } else {
        std::cmp::max(1, total / 10)
    }
}

/// Progress sink that prints throttled lines to stderr. `None` for single-item runs.
pub fn default_progress_sink(total: usize) -> Option<ProgressSink> {
    if total <= 1 {
        return None;
    }
    let step = progress_step(total);
    Some(Arc::new(move |ev: ProgressEvent| {
        if ev.done == ev.total || ev.done % step == 0 {
            eprintln!("{}", format_progress_line(ev.done, ev.total));
        }
    }))
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.3}", x)).unwrap_or_else(|| "n/a".into())
}

/// Human-readable run summary.
pub fn render_summary(report: &EvaluationReport) -> String {
    let mut out = String::new();
    let md = &report.metadata;
    let _ = writeln!(out, "Evaluation summary");
    let _ = writeln!(
        out,
        "  evaluator: {}   agent: {}   at: {}",
        md.evaluator_used,
        md.agent_quality_level,
        md.timestamp.to_rfc3339()
    );
    let _ = writeln!(
        out,
        "  items: {}   judged: {}   failed: {}{}",
        md.total_test_cases,
        md.judged,
        md.failed,
        if md.cancelled { "   (cancelled)" } else { "" }
    );

    let Some(block) = &report.metrics.aggregate else {
        let _ = writeln!(out, "\nNo judged items; no metrics.");
        render_failures(report, &mut out);
        return out;
    };

    let o = &block.overall;
    let _ = writeln!(out, "\nOverall ({} evaluations)", o.total_evaluations);
    for (name, avg, sd) in [
        ("correctness", o.avg_correctness, o.std_correctness),
        ("relevance", o.avg_relevance, o.std_relevance),
        ("completeness", o.avg_completeness, o.std_completeness),
        ("overall", o.avg_overall, o.std_overall),
    ] {
        let _ = writeln!(out, "  {:<13} {:.3} (std {:.3})", name, avg, sd);
    }
    let _ = writeln!(
        out,
        "  range {:.3}..{:.3}   p25 {:.3}  p50 {:.3}  p75 {:.3}  p90 {:.3}  p95 {:.3}",
        o.min_overall,
        o.max_overall,
        o.p25_overall,
        o.p50_overall,
        o.p75_overall,
        o.p90_overall,
        o.p95_overall
    );

    let _ = writeln!(out, "\nDistribution");
    for (label, count) in ScoreDistribution::LABELS
        .iter()
        .zip(block.distribution.counts())
    {
        let _ = writeln!(out, "  {}  {:>4}  {}", label, count, "#".repeat(count));
    }

    if !report.metrics.by_query_type.is_empty() {
        let _ = writeln!(out, "\nBy query type");
        for (t, m) in &report.metrics.by_query_type {
            let _ = writeln!(
                out,
                "  {:<16} n={:<3} overall {:.3}  correctness {:.3}  relevance {:.3}  completeness {:.3}",
                t, m.count, m.avg_overall, m.avg_correctness, m.avg_relevance, m.avg_completeness
            );
        }
    }

    let ca = &report.metrics.confidence_analysis;
    let _ = writeln!(
        out,
        "\nConfidence: correlation {}  (n={})  avg confidence {}  avg score {}  gap {}",
        opt(ca.correlation),
        ca.sample_size,
        opt(ca.avg_confidence),
        opt(ca.avg_score),
        opt(ca.confidence_accuracy_gap)
    );

    let ia = &report.metrics.improvement_areas;
    let _ = writeln!(
        out,
        "Below {:.2}: {} items ({:.1}%)   most common issue: {}",
        ia.threshold,
        ia.low_performing_count,
        ia.low_performing_percentage,
        ia.most_common_issue
            .map(|d| d.to_string())
            .unwrap_or_else(|| "none".into())
    );

    render_failures(report, &mut out);
    out
}

fn render_failures(report: &EvaluationReport, out: &mut String) {
    let failed: Vec<_> = report.failed_items().collect();
    if failed.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nFailed items");
    for item in failed {
        let label = match item.outcome {
            ItemOutcome::AgentFailed => "agent",
            ItemOutcome::JudgeFailed => "judge",
            ItemOutcome::Judged => continue,
        };
        let msg = item
            .error
            .as_ref()
            .map(|e| e.message.as_str())
            .unwrap_or("unknown error");
        let _ = writeln!(out, "  {:<12} [{}] {}", item.query_id, label, msg);
    }
}
