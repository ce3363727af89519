use super::matching::MatchOutcome;
use crate::model::{CategoryScore, MetricRecord};

/// Points deducted for each false positive.
pub const FALSE_POSITIVE_PENALTY: f64 = 0.25;

/// Computes precision, recall, F1 and points for one match outcome.
///
/// Zero denominators never produce NaN:
/// - no predictions and no ground truth: precision 1.0
/// - no predictions but ground truth present: precision 0.0
/// - no ground truth: recall 1.0, whether or not anything was predicted
pub fn compute(outcome: &MatchOutcome) -> MetricRecord {
    let tp_count = outcome.true_positives.len();
    let fp_count = outcome.false_positives.len();
    let fn_count = outcome.false_negatives.len();
    let predicted = outcome.predicted_count();
    let expected = outcome.expected_count();

    let precision = if predicted > 0 {
        tp_count as f64 / predicted as f64
    } else if expected == 0 {
        1.0
    } else {
        0.0
    };

    let recall = if expected == 0 {
        1.0
    } else {
        tp_count as f64 / expected as f64
    };

    MetricRecord {
        precision,
        recall,
        f1: f1_score(precision, recall),
        points: tp_count as f64 - FALSE_POSITIVE_PENALTY * fp_count as f64,
        tp_count,
        fp_count,
        fn_count,
    }
}

pub fn f1_score(precision: f64, recall: f64) -> f64 {
    let denominator = precision + recall;
    if denominator > 0.0 {
        2.0 * precision * recall / denominator
    } else {
        0.0
    }
}

/// Metric record plus the identifiers behind its counts.
pub fn category_score(outcome: MatchOutcome) -> CategoryScore {
    let metrics = compute(&outcome);
    CategoryScore {
        metrics,
        true_positives: outcome.true_positives,
        false_positives: outcome.false_positives,
        false_negatives: outcome.false_negatives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MisalignmentCategory;

    const EPS: f64 = 1e-12;

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn outcome(tp: &[&str], fp: &[&str], fn_: &[&str]) -> MatchOutcome {
        MatchOutcome {
            category: MisalignmentCategory::MissingImplementation,
            true_positives: owned(tp),
            false_positives: owned(fp),
            false_negatives: owned(fn_),
        }
    }

    #[test]
    fn both_empty_is_perfect() {
        let record = compute(&outcome(&[], &[], &[]));
        assert_eq!(record.precision, 1.0);
        assert_eq!(record.recall, 1.0);
        assert_eq!(record.f1, 1.0);
        assert_eq!(record.points, 0.0);
    }

    #[test]
    fn predictions_without_ground_truth_keep_vacuous_recall() {
        let record = compute(&outcome(&[], &["B", "C"], &[]));
        assert_eq!(record.precision, 0.0);
        assert_eq!(record.recall, 1.0);
        assert_eq!(record.f1, 0.0);
        assert!((record.points + 0.5).abs() < EPS);
    }

    #[test]
    fn nothing_predicted_against_ground_truth_scores_zero() {
        let record = compute(&outcome(&[], &[], &["A", "B"]));
        assert_eq!(record.precision, 0.0);
        assert_eq!(record.recall, 0.0);
        assert_eq!(record.f1, 0.0);
        assert_eq!(record.fn_count, 2);
    }

    #[test]
    fn mixed_outcome_matches_hand_computed_values() {
        let record = compute(&outcome(&["A"], &["B"], &["C"]));
        assert!((record.precision - 0.5).abs() < EPS);
        assert!((record.recall - 0.5).abs() < EPS);
        assert!((record.f1 - 0.5).abs() < EPS);
        assert!((record.points - 0.75).abs() < EPS);
    }

    #[test]
    fn points_are_unbounded_below() {
        let false_positives: Vec<String> = (0..12).map(|index| format!("fp-{index}")).collect();
        let refs: Vec<&str> = false_positives.iter().map(String::as_str).collect();
        let record = compute(&outcome(&[], &refs, &["A"]));
        assert!((record.points + 3.0).abs() < EPS);
    }

    #[test]
    fn f1_of_zero_rates_is_zero() {
        assert_eq!(f1_score(0.0, 0.0), 0.0);
        assert!((f1_score(1.0, 0.5) - 2.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn category_score_carries_identifiers() {
        let score = category_score(outcome(&["A"], &["B"], &["C"]));
        assert_eq!(score.metrics.tp_count, 1);
        assert_eq!(score.true_positives, vec!["A".to_string()]);
        assert_eq!(score.false_negatives, vec!["C".to_string()]);
    }
}
