//! Scoring and normalization engine.
//!
//! raw prediction + ground truth -> normalize -> match -> metrics -> combine
//! (per run) -> statistics (per framework/branch/category) -> reduce/compare.
//! Everything here is pure; progress and anomalies go out as `tracing` events.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ScoringError;
use crate::model::{CombinedScores, MisalignmentCategory, Scores, TestScope};

pub mod combine;
pub mod ground_truth;
pub mod matching;
pub mod metrics;
pub mod normalize;
pub mod reduce;
pub mod stats;
#[cfg(test)]
mod tests;

pub use self::combine::combine;
pub use self::ground_truth::GroundTruthRecord;
pub use self::matching::match_findings;
pub use self::normalize::{RawPrediction, normalize};
pub use self::reduce::{compare, reduce_branches, reduce_overall};
pub use self::stats::{RunMetrics, StatisticsKey, aggregate_grouped};

/// Scores one run's raw prediction against its ground truth.
pub fn score_run(
    raw_prediction: &Value,
    ground_truth: &GroundTruthRecord,
    scope: TestScope,
) -> Result<Scores, ScoringError> {
    match scope.category() {
        Some(category) => {
            let predictions = normalize(raw_prediction, category)?;
            let expected = ground_truth
                .for_category(category)
                .ok_or_else(|| missing_ground_truth(ground_truth, category))?;
            let outcome = match_findings(category, predictions.for_category(category), expected);
            Ok(Scores::Single(metrics::category_score(outcome)))
        }
        None => score_combined(raw_prediction, ground_truth).map(Scores::Combined),
    }
}

fn score_combined(
    raw_prediction: &Value,
    ground_truth: &GroundTruthRecord,
) -> Result<CombinedScores, ScoringError> {
    if ground_truth.categories.is_empty() {
        return Err(ScoringError::MalformedInput(
            "combined ground truth lists no categories".to_string(),
        ));
    }

    let predictions = match RawPrediction::classify(raw_prediction)? {
        RawPrediction::Combined(predictions) => predictions,
        RawPrediction::Wrapped(items) => {
            warn!(
                items = items.len(),
                "combined run produced a single-category record; scoring it as empty"
            );
            Default::default()
        }
    };

    let mut by_category = BTreeMap::new();
    let mut records = BTreeMap::new();
    for (category, expected) in &ground_truth.categories {
        let outcome = match_findings(*category, predictions.for_category(*category), expected);
        let score = metrics::category_score(outcome);
        records.insert(*category, score.metrics);
        by_category.insert(*category, score);
    }

    let combined = combine(&records);
    debug!(
        categories = combined.category_count,
        total_points = combined.total_points,
        "combined run scored"
    );

    Ok(CombinedScores {
        type1: by_category.remove(&MisalignmentCategory::MissingImplementation),
        type2: by_category.remove(&MisalignmentCategory::IncorrectImplementation),
        type3: by_category.remove(&MisalignmentCategory::ExtraneousCode),
        combined,
    })
}

fn missing_ground_truth(ground_truth: &GroundTruthRecord, category: MisalignmentCategory) -> ScoringError {
    ScoringError::MissingGroundTruth {
        branch: ground_truth
            .branch
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        scope: TestScope::from_category(category),
    }
}
