use std::collections::BTreeSet;

use tracing::debug;

use crate::model::{Finding, MisalignmentCategory};

/// Partition of predictions and ground truth for one category of one run.
///
/// `true_positives` + `false_positives` covers the predictions and
/// `true_positives` + `false_negatives` covers the ground truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub category: MisalignmentCategory,
    pub true_positives: Vec<String>,
    pub false_positives: Vec<String>,
    pub false_negatives: Vec<String>,
}

impl MatchOutcome {
    pub fn predicted_count(&self) -> usize {
        self.true_positives.len() + self.false_positives.len()
    }

    pub fn expected_count(&self) -> usize {
        self.true_positives.len() + self.false_negatives.len()
    }
}

pub fn match_findings(
    category: MisalignmentCategory,
    predictions: &[Finding],
    ground_truth: &[Finding],
) -> MatchOutcome {
    match category {
        MisalignmentCategory::MissingImplementation | MisalignmentCategory::ExtraneousCode => {
            match_by_key(category, predictions, ground_truth)
        }
        MisalignmentCategory::IncorrectImplementation => {
            match_by_section_and_files(predictions, ground_truth)
        }
    }
}

fn match_by_key(
    category: MisalignmentCategory,
    predictions: &[Finding],
    ground_truth: &[Finding],
) -> MatchOutcome {
    let predicted = key_set(category, predictions);
    let expected = key_set(category, ground_truth);

    MatchOutcome {
        category,
        true_positives: predicted.intersection(&expected).cloned().collect(),
        false_positives: predicted.difference(&expected).cloned().collect(),
        false_negatives: expected.difference(&predicted).cloned().collect(),
    }
}

fn key_set(category: MisalignmentCategory, findings: &[Finding]) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for finding in findings {
        match finding.identity_key() {
            Some(key) => {
                keys.insert(key);
            }
            // Legacy extraneous-code items name a feature and list its files.
            None if category == MisalignmentCategory::ExtraneousCode => {
                keys.extend(finding.feature_files());
            }
            None => {}
        }
    }
    keys
}

struct ExpectedItem {
    section: String,
    /// `None` for a bare section key, which matches on section alone.
    files: Option<BTreeSet<String>>,
    claimed: bool,
}

fn match_by_section_and_files(predictions: &[Finding], ground_truth: &[Finding]) -> MatchOutcome {
    let mut expected: Vec<ExpectedItem> = ground_truth
        .iter()
        .filter_map(|finding| {
            let files = match finding {
                Finding::Key(_) => None,
                Finding::Item(_) => Some(finding.files().unwrap_or_default()),
            };
            Some(ExpectedItem {
                section: finding.section()?,
                files,
                claimed: false,
            })
        })
        .collect();

    let mut true_positives = Vec::new();
    let mut false_positives = Vec::new();

    for prediction in predictions {
        let Some(section) = prediction.section() else {
            debug!("type2 prediction without a section skipped");
            continue;
        };
        let files = prediction.files().unwrap_or_default();

        // First unclaimed ground-truth item wins, in prediction order.
        let hit = expected.iter_mut().find(|item| {
            !item.claimed && item.section == section && files_overlap(&files, item.files.as_ref())
        });

        match hit {
            Some(item) => {
                item.claimed = true;
                true_positives.push(section);
            }
            None => false_positives.push(section),
        }
    }

    let false_negatives = expected
        .into_iter()
        .filter(|item| !item.claimed)
        .map(|item| item.section)
        .collect();

    MatchOutcome {
        category: MisalignmentCategory::IncorrectImplementation,
        true_positives,
        false_positives,
        false_negatives,
    }
}

/// A prediction without files never overlaps a ground-truth item that lists them.
fn files_overlap(predicted: &BTreeSet<String>, expected: Option<&BTreeSet<String>>) -> bool {
    match expected {
        Some(expected) => !predicted.is_disjoint(expected),
        None => true,
    }
}
