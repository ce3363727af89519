use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ErrorReport;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum MisalignmentCategory {
    #[serde(rename = "type1")]
    MissingImplementation,
    #[serde(rename = "type2")]
    IncorrectImplementation,
    #[serde(rename = "type3")]
    ExtraneousCode,
}

impl MisalignmentCategory {
    pub const ALL: [Self; 3] = [
        Self::MissingImplementation,
        Self::IncorrectImplementation,
        Self::ExtraneousCode,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingImplementation => "type1",
            Self::IncorrectImplementation => "type2",
            Self::ExtraneousCode => "type3",
        }
    }

    /// Key used by combined-form predictions and ground truth.
    pub fn record_key(self) -> &'static str {
        match self {
            Self::MissingImplementation => "type1_missing",
            Self::IncorrectImplementation => "type2_incorrect",
            Self::ExtraneousCode => "type3_extraneous",
        }
    }

    /// Key of the flat ground-truth list for this category.
    pub fn expected_key(self) -> &'static str {
        match self {
            Self::MissingImplementation | Self::IncorrectImplementation => "expected_sections",
            Self::ExtraneousCode => "expected_files",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| normalized == category.as_str() || normalized == category.record_key())
    }
}

impl fmt::Display for MisalignmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a run was asked to detect: one category, or all three at once.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestScope {
    Type1Missing,
    Type2Incorrect,
    Type3Extraneous,
    CombinedAllTypes,
}

impl TestScope {
    pub fn from_category(category: MisalignmentCategory) -> Self {
        match category {
            MisalignmentCategory::MissingImplementation => Self::Type1Missing,
            MisalignmentCategory::IncorrectImplementation => Self::Type2Incorrect,
            MisalignmentCategory::ExtraneousCode => Self::Type3Extraneous,
        }
    }

    pub fn category(self) -> Option<MisalignmentCategory> {
        match self {
            Self::Type1Missing => Some(MisalignmentCategory::MissingImplementation),
            Self::Type2Incorrect => Some(MisalignmentCategory::IncorrectImplementation),
            Self::Type3Extraneous => Some(MisalignmentCategory::ExtraneousCode),
            Self::CombinedAllTypes => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self.category() {
            Some(category) => category.record_key(),
            None => "combined_all_types",
        }
    }

    /// Short directory / file-name form (`type1`, ..., `combined`).
    pub fn dir_name(self) -> &'static str {
        match self.category() {
            Some(category) => category.as_str(),
            None => "combined",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        if matches!(normalized.as_str(), "combined" | "combined_all_types" | "all") {
            return Some(Self::CombinedAllTypes);
        }
        MisalignmentCategory::parse(&normalized).map(Self::from_category)
    }
}

impl fmt::Display for TestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported or planted misalignment: a bare identifier or an object item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Finding {
    Key(String),
    Item(Map<String, Value>),
}

impl Finding {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::key(text.as_str())),
            Value::Number(number) => Some(Self::key(number.to_string())),
            Value::Object(map) => Some(Self::Item(map.clone())),
            _ => None,
        }
    }

    pub fn key(value: impl Into<String>) -> Self {
        Self::Key(value.into())
    }

    pub fn field(&self, name: &str) -> Option<String> {
        match self {
            Self::Key(_) => None,
            Self::Item(map) => map.get(name).and_then(value_as_key),
        }
    }

    pub fn section(&self) -> Option<String> {
        match self {
            Self::Key(key) => non_blank(key),
            Self::Item(_) => self.field("section"),
        }
    }

    pub fn file(&self) -> Option<String> {
        match self {
            Self::Key(key) => non_blank(key),
            Self::Item(_) => self.field("file"),
        }
    }

    /// The `files` list of an object item; `None` when the item has none.
    pub fn files(&self) -> Option<BTreeSet<String>> {
        match self {
            Self::Key(_) => None,
            Self::Item(map) => map
                .get("files")
                .and_then(Value::as_array)
                .map(|files| files.iter().filter_map(value_as_key).collect()),
        }
    }

    /// Files of a legacy extraneous-code item that names a `feature` instead of a `file`.
    pub fn feature_files(&self) -> Vec<String> {
        if self.field("feature").is_none() {
            return Vec::new();
        }
        self.files().map(Vec::from_iter).unwrap_or_default()
    }

    /// Identifier used by key matching: the string itself, else `section`, else `file`.
    pub fn identity_key(&self) -> Option<String> {
        match self {
            Self::Key(key) => non_blank(key),
            Self::Item(_) => self.field("section").or_else(|| self.field("file")),
        }
    }
}

fn value_as_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_blank(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn non_blank(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Predictions for all three categories; the only shape scoring consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPredictions {
    pub type1_missing: Vec<Finding>,
    pub type2_incorrect: Vec<Finding>,
    pub type3_extraneous: Vec<Finding>,
}

impl CanonicalPredictions {
    pub fn for_category(&self, category: MisalignmentCategory) -> &[Finding] {
        match category {
            MisalignmentCategory::MissingImplementation => &self.type1_missing,
            MisalignmentCategory::IncorrectImplementation => &self.type2_incorrect,
            MisalignmentCategory::ExtraneousCode => &self.type3_extraneous,
        }
    }

    pub fn for_category_mut(&mut self, category: MisalignmentCategory) -> &mut Vec<Finding> {
        match category {
            MisalignmentCategory::MissingImplementation => &mut self.type1_missing,
            MisalignmentCategory::IncorrectImplementation => &mut self.type2_incorrect,
            MisalignmentCategory::ExtraneousCode => &mut self.type3_extraneous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub points: f64,
    pub tp_count: usize,
    pub fp_count: usize,
    pub fn_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    #[serde(flatten)]
    pub metrics: MetricRecord,
    pub true_positives: Vec<String>,
    pub false_positives: Vec<String>,
    pub false_negatives: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedMetricRecord {
    pub avg_precision: f64,
    pub avg_recall: f64,
    pub avg_f1: f64,
    pub total_points: f64,
    pub tp_count: usize,
    pub fp_count: usize,
    pub fn_count: usize,
    pub category_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type1: Option<CategoryScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type2: Option<CategoryScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type3: Option<CategoryScore>,
    pub combined: CombinedMetricRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scores {
    Combined(CombinedScores),
    Single(CategoryScore),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetadata {
    pub framework: String,
    pub branch: String,
    pub category: TestScope,
    #[serde(default)]
    pub run: Option<u32>,
    pub scored_at: String,
    #[serde(default)]
    pub prediction_path: String,
    #[serde(default)]
    pub ground_truth_path: String,
    #[serde(default)]
    pub prediction_sha256: String,
    #[serde(default)]
    pub ground_truth_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub metadata: ScoreMetadata,
    pub scores: Scores,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatistics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub precision: AggregateStatistics,
    pub recall: AggregateStatistics,
    pub f1_score: AggregateStatistics,
    pub points: AggregateStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionStatistics {
    pub true_positives: AggregateStatistics,
    pub false_positives: AggregateStatistics,
    pub false_negatives: AggregateStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestTypeAggregate {
    pub run_count: usize,
    pub metrics: MetricStatistics,
    pub detection_counts: DetectionStatistics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallSummary {
    pub avg_f1_score: f64,
    pub avg_points: f64,
    pub total_test_runs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetadata {
    pub aggregated_at: String,
    pub version: String,
    #[serde(default)]
    pub skipped_files: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    pub framework: String,
    pub branch: String,
    pub total_runs: usize,
    pub test_types: BTreeMap<TestScope, TestTypeAggregate>,
    pub overall: OverallSummary,
    pub metadata: AggregateMetadata,
}

/// One framework's branch aggregates reduced to a single figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkSummary {
    pub framework: String,
    pub branches: BTreeMap<String, AggregatedRecord>,
    pub overall: OverallSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkSnapshot {
    pub framework: String,
    pub branch_count: usize,
    pub total_runs: usize,
    pub avg_f1: f64,
    pub avg_points: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Leader {
    A,
    B,
    Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDelta {
    pub a: f64,
    pub b: f64,
    pub difference: f64,
    pub percent_difference: Option<f64>,
    pub leader: Leader,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FalsePositiveComparison {
    pub a_false_positives: f64,
    pub b_false_positives: f64,
    /// `a / b`; `None` when only `b` is zero.
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchComparison {
    pub f1_score: MetricDelta,
    pub points: MetricDelta,
    pub test_types: BTreeMap<TestScope, BTreeMap<String, MetricDelta>>,
    pub false_positives: FalsePositiveComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub framework_a: FrameworkSnapshot,
    pub framework_b: FrameworkSnapshot,
    pub overall: BTreeMap<String, MetricDelta>,
    pub branches: BTreeMap<String, BranchComparison>,
    pub unmatched_branches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub compared_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}
