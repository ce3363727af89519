use std::collections::BTreeMap;

use crate::error::ScoringError;
use crate::model::{
    AggregatedRecord, BranchComparison, Comparison, FalsePositiveComparison, FrameworkSnapshot,
    FrameworkSummary, Leader, MetricDelta, OverallSummary, TestScope, TestTypeAggregate,
};

/// Branch-level figure from its per-category aggregates.
///
/// Each test type present contributes its mean once, however many runs it
/// has. Test types with no runs are left out of the averages.
pub fn reduce_overall(test_types: &BTreeMap<TestScope, TestTypeAggregate>) -> OverallSummary {
    let populated: Vec<&TestTypeAggregate> = test_types
        .values()
        .filter(|aggregate| aggregate.run_count > 0)
        .collect();

    OverallSummary {
        avg_f1_score: mean(populated.iter().map(|aggregate| aggregate.metrics.f1_score.mean)),
        avg_points: mean(populated.iter().map(|aggregate| aggregate.metrics.points.mean)),
        total_test_runs: populated.iter().map(|aggregate| aggregate.run_count).sum(),
    }
}

/// Reduces one framework's branch aggregates, weighting every branch equally.
pub fn reduce_branches(framework: &str, branches: Vec<AggregatedRecord>) -> FrameworkSummary {
    let branches: BTreeMap<String, AggregatedRecord> = branches
        .into_iter()
        .map(|record| (record.branch.clone(), record))
        .collect();

    let populated: Vec<&OverallSummary> = branches
        .values()
        .map(|record| &record.overall)
        .filter(|overall| overall.total_test_runs > 0)
        .collect();

    let overall = OverallSummary {
        avg_f1_score: mean(populated.iter().map(|overall| overall.avg_f1_score)),
        avg_points: mean(populated.iter().map(|overall| overall.avg_points)),
        total_test_runs: populated.iter().map(|overall| overall.total_test_runs).sum(),
    };

    FrameworkSummary {
        framework: framework.to_string(),
        branches,
        overall,
    }
}

/// Signed and percentage differences of `b` relative to `a`.
///
/// Fails with [`ScoringError::InsufficientData`] when either side has no runs.
pub fn compare(a: &FrameworkSummary, b: &FrameworkSummary) -> Result<Comparison, ScoringError> {
    for side in [a, b] {
        if side.overall.total_test_runs == 0 {
            return Err(ScoringError::InsufficientData(format!(
                "framework `{}` has no recorded runs",
                side.framework
            )));
        }
    }

    let overall = BTreeMap::from([
        (
            "f1_score".to_string(),
            delta(a.overall.avg_f1_score, b.overall.avg_f1_score),
        ),
        (
            "points".to_string(),
            delta(a.overall.avg_points, b.overall.avg_points),
        ),
    ]);

    let mut branches = BTreeMap::new();
    let mut unmatched_branches = Vec::new();
    for (name, record_a) in &a.branches {
        match b.branches.get(name) {
            Some(record_b) => {
                branches.insert(name.clone(), compare_branch(record_a, record_b));
            }
            None => unmatched_branches.push(name.clone()),
        }
    }
    unmatched_branches.extend(
        b.branches
            .keys()
            .filter(|name| !a.branches.contains_key(*name))
            .cloned(),
    );
    unmatched_branches.sort();

    Ok(Comparison {
        framework_a: snapshot(a),
        framework_b: snapshot(b),
        overall,
        branches,
        unmatched_branches,
    })
}

fn compare_branch(a: &AggregatedRecord, b: &AggregatedRecord) -> BranchComparison {
    let mut test_types = BTreeMap::new();
    for (scope, aggregate_a) in &a.test_types {
        let Some(aggregate_b) = b.test_types.get(scope) else {
            continue;
        };
        let metrics_a = &aggregate_a.metrics;
        let metrics_b = &aggregate_b.metrics;
        let deltas = BTreeMap::from([
            (
                "precision".to_string(),
                delta(metrics_a.precision.mean, metrics_b.precision.mean),
            ),
            (
                "recall".to_string(),
                delta(metrics_a.recall.mean, metrics_b.recall.mean),
            ),
            (
                "f1_score".to_string(),
                delta(metrics_a.f1_score.mean, metrics_b.f1_score.mean),
            ),
            (
                "points".to_string(),
                delta(metrics_a.points.mean, metrics_b.points.mean),
            ),
        ]);
        test_types.insert(*scope, deltas);
    }

    BranchComparison {
        f1_score: delta(a.overall.avg_f1_score, b.overall.avg_f1_score),
        points: delta(a.overall.avg_points, b.overall.avg_points),
        test_types,
        false_positives: compare_false_positives(a, b),
    }
}

/// Mean false positives summed over the single-category test types.
fn compare_false_positives(a: &AggregatedRecord, b: &AggregatedRecord) -> FalsePositiveComparison {
    let total = |record: &AggregatedRecord| -> f64 {
        record
            .test_types
            .iter()
            .filter(|(scope, _)| scope.category().is_some())
            .map(|(_, aggregate)| aggregate.detection_counts.false_positives.mean)
            .sum()
    };
    let a_false_positives = total(a);
    let b_false_positives = total(b);

    let ratio = if b_false_positives > 0.0 {
        Some(a_false_positives / b_false_positives)
    } else if a_false_positives > 0.0 {
        None
    } else {
        Some(1.0)
    };

    FalsePositiveComparison {
        a_false_positives,
        b_false_positives,
        ratio,
    }
}

/// `percent_difference` is relative to `|a|`, so its sign always follows `difference`.
fn delta(a: f64, b: f64) -> MetricDelta {
    let difference = b - a;
    let percent_difference = if a != 0.0 {
        Some(difference / a.abs() * 100.0)
    } else {
        None
    };
    let leader = if difference > 0.0 {
        Leader::B
    } else if difference < 0.0 {
        Leader::A
    } else {
        Leader::Tie
    };

    MetricDelta {
        a,
        b,
        difference,
        percent_difference,
        leader,
    }
}

fn snapshot(summary: &FrameworkSummary) -> FrameworkSnapshot {
    FrameworkSnapshot {
        framework: summary.framework.clone(),
        branch_count: summary.branches.len(),
        total_runs: summary.overall.total_test_runs,
        avg_f1: summary.overall.avg_f1_score,
        avg_points: summary.overall.avg_points,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
