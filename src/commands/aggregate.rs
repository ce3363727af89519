use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use tracing::{info, warn};

use super::layout::{ResultsLayout, SCORED_SUFFIX};
use crate::cli::AggregateArgs;
use crate::model::{AggregateMetadata, AggregatedRecord, ScoredRecord};
use crate::scoring::{StatisticsKey, aggregate_grouped, reduce_overall};
use crate::util::{list_sorted, now_utc_string, read_json, write_json_pretty};

pub const AGGREGATE_VERSION: &str = "1.0.0";

pub fn run(args: AggregateArgs) -> Result<()> {
    let layout = ResultsLayout::new(&args.results_dir);
    let branch_dir = layout.processed_dir(&args.framework, &args.branch);
    if !branch_dir.exists() {
        bail!(
            "no results found for {}/{} at {}",
            args.framework,
            args.branch,
            branch_dir.display()
        );
    }

    let (records, skipped_files) = load_scored_records(&branch_dir)?;
    if records.is_empty() {
        bail!("no scored results found in {}", branch_dir.display());
    }

    let aggregated = aggregate_branch(&args.framework, &args.branch, &records, skipped_files);
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| layout.summary_path(&args.framework, &args.branch));
    write_json_pretty(&output_path, &aggregated)?;

    log_summary(&aggregated);
    info!(path = %output_path.display(), "wrote aggregated results");
    Ok(())
}

/// Loads every `*_scored.json` in `dir`; unreadable files are logged and counted.
pub fn load_scored_records(dir: &Path) -> Result<(Vec<ScoredRecord>, usize)> {
    let paths = list_sorted(dir, |path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(SCORED_SUFFIX))
    })?;

    let mut records = Vec::with_capacity(paths.len());
    let mut skipped = 0;
    for path in paths {
        match read_json::<ScoredRecord>(&path) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "could not load scored result");
                skipped += 1;
            }
        }
    }

    Ok((records, skipped))
}

/// Aggregates one framework/branch; records for any other pair are ignored.
pub fn aggregate_branch(
    framework: &str,
    branch: &str,
    records: &[ScoredRecord],
    skipped_files: usize,
) -> AggregatedRecord {
    let mut test_types = BTreeMap::new();
    for (key, aggregate) in aggregate_grouped(records) {
        let StatisticsKey {
            framework: record_framework,
            branch: record_branch,
            scope,
        } = key;
        if record_framework != framework || record_branch != branch {
            warn!(
                framework = %record_framework,
                branch = %record_branch,
                runs = aggregate.run_count,
                "ignoring scored results for another framework/branch"
            );
            continue;
        }
        test_types.insert(scope, aggregate);
    }

    let overall = reduce_overall(&test_types);
    AggregatedRecord {
        framework: framework.to_string(),
        branch: branch.to_string(),
        total_runs: overall.total_test_runs,
        test_types,
        overall,
        metadata: AggregateMetadata {
            aggregated_at: now_utc_string(),
            version: AGGREGATE_VERSION.to_string(),
            skipped_files,
        },
    }
}

fn log_summary(aggregated: &AggregatedRecord) {
    for (scope, aggregate) in &aggregated.test_types {
        let metrics = &aggregate.metrics;
        let counts = &aggregate.detection_counts;
        info!(
            test_type = %scope,
            runs = aggregate.run_count,
            f1_mean = metrics.f1_score.mean,
            f1_std = metrics.f1_score.std,
            precision_mean = metrics.precision.mean,
            recall_mean = metrics.recall.mean,
            points_mean = metrics.points.mean,
            true_positives_mean = counts.true_positives.mean,
            false_positives_mean = counts.false_positives.mean,
            false_negatives_mean = counts.false_negatives.mean,
            "test type summary"
        );
    }

    info!(
        framework = %aggregated.framework,
        branch = %aggregated.branch,
        total_runs = aggregated.total_runs,
        avg_f1_score = aggregated.overall.avg_f1_score,
        avg_points = aggregated.overall.avg_points,
        skipped_files = aggregated.metadata.skipped_files,
        "overall performance"
    );
}
