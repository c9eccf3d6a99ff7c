use std::fmt::Write;

use crate::models::{ComplianceStatus, Severity};
use crate::summary::{BenchmarkSummary, ResultAccumulator};

const STATUSES: [ComplianceStatus; 5] = [
    ComplianceStatus::Ok,
    ComplianceStatus::Alarm,
    ComplianceStatus::Info,
    ComplianceStatus::Skip,
    ComplianceStatus::Error,
];

const SEVERITIES: [Severity; 5] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
    Severity::None,
];

fn count<K: Ord>(map: &std::collections::BTreeMap<K, u64>, key: &K) -> u64 {
    map.get(key).copied().unwrap_or(0)
}

fn format_cost(cost: Option<f64>) -> String {
    cost.map(|c| format!("{:.2}", c)).unwrap_or_else(|| "-".to_string())
}

pub fn format_status_table(acc: &ResultAccumulator) -> String {
    let mut out = String::from("| Status | Count |\n|---|---|\n");
    for status in STATUSES {
        let _ = writeln!(out, "| {} | {} |", status, count(&acc.query_result, &status));
    }
    let _ = writeln!(out, "| **Total** | **{}** |", acc.total());
    out
}

pub fn format_severity_table(acc: &ResultAccumulator) -> String {
    let mut out = String::from("| Severity | Count |\n|---|---|\n");
    for severity in SEVERITIES {
        let _ = writeln!(out, "| {} | {} |", severity, count(&acc.severity_result, &severity));
    }
    out
}

/// Markdown report for a summarized benchmark run.
pub fn format_summary_markdown(summary: &BenchmarkSummary) -> String {
    let whole = &summary.connections.benchmark;
    let mut out = String::new();

    let _ = writeln!(out, "# Benchmark {} (job {})\n", summary.benchmark_id, summary.job_id);
    let _ = writeln!(
        out,
        "**Security score:** {:.1}%  \n**Results:** {}  \n**Cost impact:** {}\n",
        summary.security_score(),
        summary.total_results(),
        format_cost(whole.result.cost_impact),
    );

    out.push_str("## Results by Status\n\n");
    out.push_str(&format_status_table(&whole.result));

    out.push_str("\n## Findings by Severity\n\n");
    out.push_str(&format_severity_table(&whole.result));

    if !summary.connections.connections.is_empty() {
        out.push_str("\n## Connections\n\n| Connection | Score | OK | Failed | Total |\n|---|---|---|---|---|\n");
        for (id, group) in &summary.connections.connections {
            let _ = writeln!(
                out,
                "| {} | {:.1}% | {} | {} | {} |",
                id,
                group.result.security_score,
                group.result.passed(),
                group.result.failed(),
                group.result.total(),
            );
        }
    }

    let failed: Vec<_> = whole.failed_controls().collect();
    out.push_str("\n## Failing Controls\n\n");
    if failed.is_empty() {
        out.push_str("No failing controls.\n");
    } else {
        out.push_str("| Control | Failed resources | Total resources | Failed connections | Cost impact |\n|---|---|---|---|---|\n");
        for (id, control) in failed {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {}/{} | {} |",
                id,
                control.failed_resources_count,
                control.total_resources_count,
                control.failed_connection_count,
                control.total_connection_count,
                format_cost(control.cost_impact),
            );
        }
    }

    if !summary.resource_collections.is_empty() {
        out.push_str("\n## Resource Collections\n\n| Collection | Score | Total |\n|---|---|---|\n");
        for (id, breakdown) in &summary.resource_collections {
            let _ = writeln!(
                out,
                "| {} | {:.1}% | {} |",
                id,
                breakdown.benchmark.result.security_score,
                breakdown.benchmark.result.total(),
            );
        }
    }

    out
}
