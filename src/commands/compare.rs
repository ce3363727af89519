use anyhow::Result;
use tracing::{info, warn};

use super::layout::{ResultsLayout, subdirectory_names};
use crate::cli::CompareArgs;
use crate::model::{AggregatedRecord, ComparisonReport, FrameworkSummary};
use crate::scoring::{compare, reduce_branches};
use crate::util::{now_utc_string, read_json, write_json_pretty};

pub fn run(args: CompareArgs) -> Result<()> {
    let layout = ResultsLayout::new(&args.results_dir);
    let report = build_report(&layout, &args.framework_a, &args.framework_b, &args.branches)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| layout.comparison_path(&args.framework_a, &args.framework_b));
    write_json_pretty(&output_path, &report)?;
    info!(path = %output_path.display(), "wrote comparison");
    Ok(())
}

/// Compares two frameworks; a side without runs yields an error report, not a failure.
pub fn build_report(
    layout: &ResultsLayout,
    framework_a: &str,
    framework_b: &str,
    branches: &[String],
) -> Result<ComparisonReport> {
    let summary_a = load_framework(layout, framework_a, branches)?;
    let summary_b = load_framework(layout, framework_b, branches)?;

    let report = match compare(&summary_a, &summary_b) {
        Ok(comparison) => {
            for (metric, delta) in &comparison.overall {
                info!(
                    metric = %metric,
                    a = delta.a,
                    b = delta.b,
                    difference = delta.difference,
                    percent_difference = delta.percent_difference.unwrap_or(f64::NAN),
                    leader = ?delta.leader,
                    "framework comparison"
                );
            }
            if !comparison.unmatched_branches.is_empty() {
                warn!(branches = ?comparison.unmatched_branches, "branches summarized for only one framework");
            }
            ComparisonReport {
                compared_at: now_utc_string(),
                comparison: Some(comparison),
                error: None,
            }
        }
        Err(err) => {
            warn!(error = %err, "comparison not possible");
            ComparisonReport {
                compared_at: now_utc_string(),
                comparison: None,
                error: Some(err.report()),
            }
        }
    };

    Ok(report)
}

fn load_framework(layout: &ResultsLayout, framework: &str, branches: &[String]) -> Result<FrameworkSummary> {
    let branch_names = if branches.is_empty() {
        subdirectory_names(&layout.analysis_dir(framework))?
    } else {
        branches.to_vec()
    };

    let mut records = Vec::with_capacity(branch_names.len());
    for branch in branch_names {
        let path = layout.summary_path(framework, &branch);
        if !path.exists() {
            warn!(framework, branch = %branch, path = %path.display(), "missing aggregated results; run aggregate first");
            continue;
        }
        match read_json::<AggregatedRecord>(&path) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "could not load aggregated results");
            }
        }
    }

    let summary = reduce_branches(framework, records);
    info!(
        framework,
        branches = summary.branches.len(),
        total_runs = summary.overall.total_test_runs,
        avg_f1_score = summary.overall.avg_f1_score,
        avg_points = summary.overall.avg_points,
        "framework summary"
    );
    Ok(summary)
}
