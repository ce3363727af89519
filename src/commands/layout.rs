use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::TestScope;

pub const SCORED_SUFFIX: &str = "_scored.json";

/// Directory conventions under the results root.
#[derive(Debug, Clone)]
pub struct ResultsLayout {
    root: PathBuf,
}

impl ResultsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn raw_runs_dir(&self, framework: &str, branch: &str, scope: TestScope) -> PathBuf {
        self.raw_dir().join(framework).join(branch).join(scope.dir_name())
    }

    pub fn processed_dir(&self, framework: &str, branch: &str) -> PathBuf {
        self.root.join("processed").join(framework).join(branch)
    }

    pub fn scored_path(&self, framework: &str, branch: &str, scope: TestScope, run: u32) -> PathBuf {
        self.processed_dir(framework, branch)
            .join(format!("{}_run{run}{SCORED_SUFFIX}", scope.dir_name()))
    }

    pub fn analysis_dir(&self, framework: &str) -> PathBuf {
        self.root.join("analysis").join(framework)
    }

    pub fn summary_path(&self, framework: &str, branch: &str) -> PathBuf {
        self.analysis_dir(framework)
            .join(branch)
            .join(format!("{branch}_summary.json"))
    }

    pub fn comparison_path(&self, framework_a: &str, framework_b: &str) -> PathBuf {
        self.root
            .join("analysis")
            .join("comparisons")
            .join(format!("{framework_a}_vs_{framework_b}.json"))
    }
}

pub fn ground_truth_path(benchmark_dir: &Path, branch: &str, scope: TestScope) -> PathBuf {
    benchmark_dir
        .join("branches")
        .join(branch)
        .join(format!("ground-truth-{}.json", scope.dir_name()))
}

/// Matches run files named `run1.json`, `run-2.json` or `run_3.json`.
pub struct RunFilePattern(Regex);

impl RunFilePattern {
    pub fn new() -> Result<Self> {
        let pattern =
            Regex::new(r"^run[-_]?(\d+)\.json$").context("failed to compile run file regex")?;
        Ok(Self(pattern))
    }

    pub fn run_number(&self, file_name: &str) -> Option<u32> {
        self.0
            .captures(file_name)
            .and_then(|captures| captures.get(1))
            .and_then(|number| number.as_str().parse().ok())
    }
}

/// Names of the immediate subdirectories of `dir`, sorted.
pub fn subdirectory_names(dir: &Path) -> Result<Vec<String>> {
    let dirs = crate::util::list_sorted(dir, Path::is_dir)?;
    Ok(dirs
        .iter()
        .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
        .map(ToOwned::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_numbers_accept_common_spellings() {
        let pattern = RunFilePattern::new().expect("run pattern should compile");
        assert_eq!(pattern.run_number("run1.json"), Some(1));
        assert_eq!(pattern.run_number("run-12.json"), Some(12));
        assert_eq!(pattern.run_number("run_3.json"), Some(3));
        assert_eq!(pattern.run_number("run.json"), None);
        assert_eq!(pattern.run_number("summary.json"), None);
        assert_eq!(pattern.run_number("run1.json.bak"), None);
    }

    #[test]
    fn layout_paths_follow_conventions() {
        let layout = ResultsLayout::new("results");
        assert_eq!(
            layout.raw_runs_dir("cursor", "type1_heavy", TestScope::Type1Missing),
            PathBuf::from("results/raw/cursor/type1_heavy/type1")
        );
        assert_eq!(
            layout.scored_path("cursor", "type1_heavy", TestScope::CombinedAllTypes, 4),
            PathBuf::from("results/processed/cursor/type1_heavy/combined_run4_scored.json")
        );
        assert_eq!(
            layout.summary_path("claude-code", "distributed"),
            PathBuf::from("results/analysis/claude-code/distributed/distributed_summary.json")
        );
        assert_eq!(
            ground_truth_path(Path::new("benchmark"), "distributed", TestScope::Type3Extraneous),
            PathBuf::from("benchmark/branches/distributed/ground-truth-type3.json")
        );
    }
}
