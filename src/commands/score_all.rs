use std::path::Path;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::layout::{ResultsLayout, RunFilePattern, ground_truth_path, subdirectory_names};
use super::score::{ScoreJob, log_scores};
use crate::cli::ScoreAllArgs;
use crate::error::ScoringError;
use crate::model::TestScope;
use crate::util::{list_sorted, read_json_value, write_json_pretty};

const SCOPES: [TestScope; 4] = [
    TestScope::Type1Missing,
    TestScope::Type2Incorrect,
    TestScope::Type3Extraneous,
    TestScope::CombinedAllTypes,
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoreAllCounts {
    pub scored: usize,
    pub skipped_files: usize,
    pub skipped_categories: usize,
}

pub fn run(args: ScoreAllArgs) -> Result<()> {
    let layout = ResultsLayout::new(&args.results_dir);
    let counts = score_tree(&layout, &args.benchmark_dir, &args.frameworks, &args.branches)?;

    info!(
        scored = counts.scored,
        skipped_files = counts.skipped_files,
        skipped_categories = counts.skipped_categories,
        "batch scoring completed"
    );
    Ok(())
}

/// Scores every run file under `raw/`; bad files and missing ground truth are skipped.
pub fn score_tree(
    layout: &ResultsLayout,
    benchmark_dir: &Path,
    frameworks: &[String],
    branches: &[String],
) -> Result<ScoreAllCounts> {
    let pattern = RunFilePattern::new()?;
    let mut counts = ScoreAllCounts::default();

    for framework in selected(subdirectory_names(&layout.raw_dir())?, frameworks) {
        let framework_dir = layout.raw_dir().join(&framework);
        for branch in selected(subdirectory_names(&framework_dir)?, branches) {
            for scope in SCOPES {
                let runs_dir = layout.raw_runs_dir(&framework, &branch, scope);
                let run_files = list_sorted(&runs_dir, Path::is_file)?;
                if run_files.is_empty() {
                    continue;
                }

                let gt_path = ground_truth_path(benchmark_dir, &branch, scope);
                let Some(ground_truth) = load_ground_truth(&gt_path, &branch, scope) else {
                    counts.skipped_categories += 1;
                    continue;
                };

                for run_file in run_files {
                    let Some(run) = run_file
                        .file_name()
                        .and_then(|name| name.to_str())
                        .and_then(|name| pattern.run_number(name))
                    else {
                        debug!(path = %run_file.display(), "not a run file");
                        continue;
                    };

                    let job = ScoreJob {
                        prediction_path: &run_file,
                        ground_truth_path: &gt_path,
                        framework: &framework,
                        branch: Some(branch.as_str()),
                        scope,
                        run: Some(run),
                    };
                    let scored = read_json_value(&run_file)
                        .and_then(|prediction| job.score(&prediction, &ground_truth));
                    match scored {
                        Ok(record) => {
                            write_json_pretty(&layout.scored_path(&framework, &branch, scope, run), &record)?;
                            log_scores(&record);
                            counts.scored += 1;
                        }
                        Err(err) => {
                            warn!(path = %run_file.display(), error = %format!("{err:#}"), "skipping run file");
                            counts.skipped_files += 1;
                        }
                    }
                }
            }
        }
    }

    Ok(counts)
}

fn load_ground_truth(path: &Path, branch: &str, scope: TestScope) -> Option<Value> {
    if !path.exists() {
        let err = ScoringError::MissingGroundTruth {
            branch: branch.to_string(),
            scope,
        };
        warn!(path = %path.display(), scope = %scope, error = %err, "skipping category");
        return None;
    }

    match read_json_value(path) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "skipping category with unreadable ground truth");
            None
        }
    }
}

fn selected(available: Vec<String>, wanted: &[String]) -> Vec<String> {
    if wanted.is_empty() {
        available
    } else {
        available.into_iter().filter(|name| wanted.contains(name)).collect()
    }
}
