use serde::Serialize;
use thiserror::Error;

use crate::model::TestScope;

/// Errors raised by the scoring core.
///
/// None of these abort a batch: callers recover at the per-file boundary
/// (log and skip) or turn them into a structured result.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// A prediction or ground-truth record is not a JSON object.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// No ground truth exists for the requested branch and category.
    #[error("no ground truth for branch `{branch}` category `{scope}`")]
    MissingGroundTruth { branch: String, scope: TestScope },

    /// Too few runs to compute the requested figure.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

impl ScoringError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::MissingGroundTruth { .. } => "missing_ground_truth",
            Self::InsufficientData(_) => "insufficient_data",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

/// Serializable form of a [`ScoringError`], written in place of a result.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}
