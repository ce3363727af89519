use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use super::normalize::json_kind;
use crate::error::ScoringError;
use crate::model::{Finding, MisalignmentCategory, TestScope};

/// Planted misalignments for one branch, per category.
///
/// A category missing from `categories` was not part of the benchmark for
/// this record and is excluded from scoring, as opposed to present-but-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruthRecord {
    pub branch: Option<String>,
    pub test_scope: Option<TestScope>,
    pub categories: BTreeMap<MisalignmentCategory, Vec<Finding>>,
}

impl GroundTruthRecord {
    /// Parses a ground-truth file for `scope`.
    ///
    /// For a single category the lookup order is `ground_truth.misalignments`,
    /// `ground_truth.<record key>`, top-level `<record key>`, then the flat
    /// `expected_sections` / `expected_files` list. Combined scope only reads the
    /// keyed forms, one per category.
    pub fn from_value(raw: &Value, scope: TestScope) -> Result<Self, ScoringError> {
        let map = raw.as_object().ok_or_else(|| {
            ScoringError::MalformedInput(format!(
                "ground-truth record must be a JSON object, found {}",
                json_kind(raw)
            ))
        })?;
        let nested = map.get("ground_truth").and_then(Value::as_object);

        let mut categories = BTreeMap::new();
        match scope.category() {
            Some(category) => {
                let items = nested
                    .and_then(|inner| inner.get("misalignments"))
                    .or_else(|| keyed_items(map, nested, category))
                    .or_else(|| map.get(category.expected_key()));
                let findings = match items {
                    Some(value) => findings_from(value, category),
                    None => {
                        warn!(category = %category, "ground truth has no recognizable list; treating as empty");
                        Vec::new()
                    }
                };
                categories.insert(category, findings);
            }
            None => {
                for category in MisalignmentCategory::ALL {
                    if let Some(value) = keyed_items(map, nested, category) {
                        categories.insert(category, findings_from(value, category));
                    }
                }
            }
        }

        Ok(Self {
            branch: map
                .get("test_branch")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
            test_scope: map
                .get("test_type")
                .and_then(Value::as_str)
                .and_then(TestScope::parse),
            categories,
        })
    }

    pub fn for_category(&self, category: MisalignmentCategory) -> Option<&[Finding]> {
        self.categories.get(&category).map(Vec::as_slice)
    }
}

fn keyed_items<'a>(
    map: &'a Map<String, Value>,
    nested: Option<&'a Map<String, Value>>,
    category: MisalignmentCategory,
) -> Option<&'a Value> {
    nested
        .and_then(|inner| inner.get(category.record_key()))
        .or_else(|| map.get(category.record_key()))
}

fn findings_from(value: &Value, category: MisalignmentCategory) -> Vec<Finding> {
    match value.as_array() {
        Some(items) => items.iter().filter_map(Finding::from_value).collect(),
        None => {
            warn!(
                category = %category,
                found = json_kind(value),
                "ground-truth entry is not a sequence; treating as empty"
            );
            Vec::new()
        }
    }
}
