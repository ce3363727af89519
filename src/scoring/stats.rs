use std::collections::BTreeMap;

use crate::model::{
    AggregateStatistics, DetectionStatistics, MetricStatistics, ScoredRecord, Scores, TestScope,
    TestTypeAggregate,
};

/// Descriptive statistics over `values`.
///
/// Empty input gives all zeros with `count == 0`; `std` is the sample
/// standard deviation and 0 for fewer than two values.
pub fn aggregate(values: &[f64]) -> AggregateStatistics {
    if values.is_empty() {
        return AggregateStatistics::default();
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let squared: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
        (squared / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|left, right| left.total_cmp(right));
    let middle = count / 2;
    let median = if count % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    };

    AggregateStatistics {
        mean,
        std,
        min: sorted[0],
        max: sorted[count - 1],
        median,
        count,
    }
}

/// Scalar view of one run's scores, whichever form they were recorded in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub points: f64,
    pub tp_count: usize,
    pub fp_count: usize,
    pub fn_count: usize,
}

impl From<&Scores> for RunMetrics {
    fn from(scores: &Scores) -> Self {
        match scores {
            Scores::Single(score) => Self {
                precision: score.metrics.precision,
                recall: score.metrics.recall,
                f1: score.metrics.f1,
                points: score.metrics.points,
                tp_count: score.metrics.tp_count,
                fp_count: score.metrics.fp_count,
                fn_count: score.metrics.fn_count,
            },
            Scores::Combined(scores) => Self {
                precision: scores.combined.avg_precision,
                recall: scores.combined.avg_recall,
                f1: scores.combined.avg_f1,
                points: scores.combined.total_points,
                tp_count: scores.combined.tp_count,
                fp_count: scores.combined.fp_count,
                fn_count: scores.combined.fn_count,
            },
        }
    }
}

/// Statistics for every metric and detection count across the given runs.
pub fn aggregate_runs(runs: &[RunMetrics]) -> TestTypeAggregate {
    let column = |pick: fn(&RunMetrics) -> f64| runs.iter().map(pick).collect::<Vec<_>>();

    TestTypeAggregate {
        run_count: runs.len(),
        metrics: MetricStatistics {
            precision: aggregate(&column(|run| run.precision)),
            recall: aggregate(&column(|run| run.recall)),
            f1_score: aggregate(&column(|run| run.f1)),
            points: aggregate(&column(|run| run.points)),
        },
        detection_counts: DetectionStatistics {
            true_positives: aggregate(&column(|run| run.tp_count as f64)),
            false_positives: aggregate(&column(|run| run.fp_count as f64)),
            false_negatives: aggregate(&column(|run| run.fn_count as f64)),
        },
    }
}

/// Grouping key for run statistics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatisticsKey {
    pub framework: String,
    pub branch: String,
    pub scope: TestScope,
}

impl StatisticsKey {
    pub fn of(record: &ScoredRecord) -> Self {
        Self {
            framework: record.metadata.framework.clone(),
            branch: record.metadata.branch.clone(),
            scope: record.metadata.category,
        }
    }
}

/// Independent statistics for each (framework, branch, category) triple.
pub fn aggregate_grouped(records: &[ScoredRecord]) -> BTreeMap<StatisticsKey, TestTypeAggregate> {
    let mut grouped: BTreeMap<StatisticsKey, Vec<RunMetrics>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(StatisticsKey::of(record))
            .or_default()
            .push(RunMetrics::from(&record.scores));
    }

    grouped
        .into_iter()
        .map(|(key, runs)| (key, aggregate_runs(&runs)))
        .collect()
}
