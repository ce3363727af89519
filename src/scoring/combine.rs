use std::collections::BTreeMap;

use crate::model::{CombinedMetricRecord, MetricRecord, MisalignmentCategory};

/// Folds the per-category records of one run into a combined record.
///
/// Rates are averaged over the categories present; counts and points are
/// summed. An absent category does not count as zero.
pub fn combine(records: &BTreeMap<MisalignmentCategory, MetricRecord>) -> CombinedMetricRecord {
    if records.is_empty() {
        return CombinedMetricRecord::default();
    }

    let category_count = records.len();
    let mut combined = CombinedMetricRecord {
        category_count,
        ..CombinedMetricRecord::default()
    };
    for record in records.values() {
        combined.avg_precision += record.precision;
        combined.avg_recall += record.recall;
        combined.avg_f1 += record.f1;
        combined.total_points += record.points;
        combined.tp_count += record.tp_count;
        combined.fp_count += record.fp_count;
        combined.fn_count += record.fn_count;
    }

    let divisor = category_count as f64;
    combined.avg_precision /= divisor;
    combined.avg_recall /= divisor;
    combined.avg_f1 /= divisor;
    combined
}
