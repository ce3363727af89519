use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::info;

use crate::cli::ScoreArgs;
use crate::model::{ScoreMetadata, ScoredRecord, Scores, TestScope};
use crate::scoring::{GroundTruthRecord, RunMetrics, score_run};
use crate::util::{now_utc_string, read_json_value, sha256_file, write_json_pretty};

pub fn run(args: ScoreArgs) -> Result<()> {
    let ground_truth_raw = read_json_value(&args.ground_truth)?;
    let prediction_raw = read_json_value(&args.prediction)?;

    let scope = match args.category {
        Some(category) => category.scope(),
        None => infer_scope(&ground_truth_raw, &prediction_raw).with_context(|| {
            format!(
                "cannot infer category for {}; pass --category",
                args.prediction.display()
            )
        })?,
    };

    let job = ScoreJob {
        prediction_path: &args.prediction,
        ground_truth_path: &args.ground_truth,
        framework: &args.framework,
        branch: args.branch.as_deref(),
        scope,
        run: args.run,
    };
    let record = job.score(&prediction_raw, &ground_truth_raw)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.prediction));
    write_json_pretty(&output_path, &record)?;

    log_scores(&record);
    info!(path = %output_path.display(), "wrote scored record");

    Ok(())
}

/// One prediction file scored against one ground-truth file.
pub struct ScoreJob<'a> {
    pub prediction_path: &'a Path,
    pub ground_truth_path: &'a Path,
    pub framework: &'a str,
    pub branch: Option<&'a str>,
    pub scope: TestScope,
    pub run: Option<u32>,
}

impl ScoreJob<'_> {
    pub fn score(&self, prediction_raw: &Value, ground_truth_raw: &Value) -> Result<ScoredRecord> {
        let ground_truth = GroundTruthRecord::from_value(ground_truth_raw, self.scope)
            .with_context(|| format!("invalid ground truth: {}", self.ground_truth_path.display()))?;
        let scores = score_run(prediction_raw, &ground_truth, self.scope)
            .with_context(|| format!("failed to score {}", self.prediction_path.display()))?;

        let branch = self
            .branch
            .map(ToOwned::to_owned)
            .or_else(|| ground_truth.branch.clone())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(ScoredRecord {
            metadata: ScoreMetadata {
                framework: self.framework.to_string(),
                branch,
                category: self.scope,
                run: self.run,
                scored_at: now_utc_string(),
                prediction_path: self.prediction_path.display().to_string(),
                ground_truth_path: self.ground_truth_path.display().to_string(),
                prediction_sha256: sha256_file(self.prediction_path)?,
                ground_truth_sha256: sha256_file(self.ground_truth_path)?,
            },
            scores,
        })
    }
}

fn infer_scope(ground_truth: &Value, prediction: &Value) -> Result<TestScope> {
    let declared = ground_truth
        .get("test_type")
        .or_else(|| prediction.get("analysis_type"))
        .and_then(Value::as_str);

    match declared {
        Some(value) => TestScope::parse(value)
            .with_context(|| format!("unknown test type `{value}`")),
        None => bail!("neither ground truth `test_type` nor prediction `analysis_type` is set"),
    }
}

fn default_output_path(prediction: &Path) -> PathBuf {
    let stem = prediction
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("prediction");
    prediction.with_file_name(format!("scored_{stem}.json"))
}

pub fn log_scores(record: &ScoredRecord) {
    let metrics = RunMetrics::from(&record.scores);
    let kind = match record.scores {
        Scores::Single(_) => "single",
        Scores::Combined(_) => "combined",
    };
    info!(
        framework = %record.metadata.framework,
        branch = %record.metadata.branch,
        category = %record.metadata.category,
        run = record.metadata.run.unwrap_or_default(),
        kind,
        precision = metrics.precision,
        recall = metrics.recall,
        f1 = metrics.f1,
        points = metrics.points,
        true_positives = metrics.tp_count,
        false_positives = metrics.fp_count,
        false_negatives = metrics.fn_count,
        "scored run"
    );
}
