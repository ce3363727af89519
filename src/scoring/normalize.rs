use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ScoringError;
use crate::model::{CanonicalPredictions, Finding, MisalignmentCategory};

const WRAPPED_KEY: &str = "misalignments";

/// The two prediction shapes tools emit, decided once at the normalizer boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPrediction {
    /// `type1_missing` / `type2_incorrect` / `type3_extraneous` keys.
    Combined(CanonicalPredictions),
    /// A single `misalignments` list whose meaning depends on the declared category.
    Wrapped(Vec<Value>),
}

impl RawPrediction {
    pub fn classify(raw: &Value) -> Result<Self, ScoringError> {
        let map = raw.as_object().ok_or_else(|| {
            ScoringError::MalformedInput(format!(
                "prediction record must be a JSON object, found {}",
                json_kind(raw)
            ))
        })?;

        let is_combined = MisalignmentCategory::ALL
            .iter()
            .any(|category| map.contains_key(category.record_key()));
        if is_combined {
            let mut canonical = CanonicalPredictions::default();
            for category in MisalignmentCategory::ALL {
                *canonical.for_category_mut(category) =
                    sequence_at(map, category.record_key()).iter().filter_map(Finding::from_value).collect();
            }
            return Ok(Self::Combined(canonical));
        }

        if !map.contains_key(WRAPPED_KEY) {
            debug!("prediction record has neither combined keys nor misalignments; treating as empty");
        }
        Ok(Self::Wrapped(sequence_at(map, WRAPPED_KEY).to_vec()))
    }
}

/// Maps a raw prediction record onto the canonical three-bucket record.
pub fn normalize(
    raw: &Value,
    category: MisalignmentCategory,
) -> Result<CanonicalPredictions, ScoringError> {
    Ok(normalize_classified(RawPrediction::classify(raw)?, category))
}

pub fn normalize_classified(
    raw: RawPrediction,
    category: MisalignmentCategory,
) -> CanonicalPredictions {
    let items = match raw {
        RawPrediction::Combined(canonical) => return canonical,
        RawPrediction::Wrapped(items) => items,
    };

    let findings = items.iter().filter_map(Finding::from_value);
    let projected: Vec<Finding> = match category {
        MisalignmentCategory::MissingImplementation => findings
            .filter_map(|finding| finding.section())
            .map(Finding::Key)
            .collect(),
        MisalignmentCategory::IncorrectImplementation => findings.collect(),
        MisalignmentCategory::ExtraneousCode => findings
            .flat_map(|finding| match finding.file() {
                Some(file) => vec![file],
                None => finding.feature_files(),
            })
            .map(Finding::Key)
            .collect(),
    };

    let skipped = items.len().saturating_sub(projected.len());
    if skipped > 0 {
        debug!(
            category = %category,
            skipped,
            "wrapped prediction items without an identifying field were skipped"
        );
    }

    let mut canonical = CanonicalPredictions::default();
    *canonical.for_category_mut(category) = projected;
    canonical
}

fn sequence_at<'a>(map: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match map.get(key) {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(key, found = json_kind(other), "expected a sequence; treating as empty");
            &[]
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn combined_form_passes_through_for_any_declared_category() {
        let raw = json!({
            "type1_missing": ["3.1"],
            "type2_incorrect": [{"section": "4.2", "files": ["a.py"]}],
            "type3_extraneous": ["extra.py"]
        });

        let canonical = normalize(&raw, MisalignmentCategory::ExtraneousCode)
            .expect("combined record should normalize");
        assert_eq!(canonical.type1_missing, vec![Finding::key("3.1")]);
        assert_eq!(canonical.type2_incorrect.len(), 1);
        assert_eq!(canonical.type3_extraneous, vec![Finding::key("extra.py")]);
    }

    #[test]
    fn partial_combined_form_fills_missing_buckets() {
        let raw = json!({"type2_incorrect": [{"section": "4.2", "files": ["a.py"]}]});
        let canonical = normalize(&raw, MisalignmentCategory::IncorrectImplementation)
            .expect("partial combined record should normalize");
        assert!(canonical.type1_missing.is_empty());
        assert!(canonical.type3_extraneous.is_empty());
        assert_eq!(canonical.type2_incorrect.len(), 1);
    }

    #[test]
    fn wrapped_type1_projects_sections_and_skips_items_without_one() {
        let raw = json!({
            "misalignments": [
                {"section": "2.1", "reasoning": "not implemented"},
                {"reasoning": "no section given"},
                {"section": "5.4"}
            ]
        });

        let canonical = normalize(&raw, MisalignmentCategory::MissingImplementation)
            .expect("wrapped record should normalize");
        assert_eq!(
            canonical.type1_missing,
            vec![Finding::key("2.1"), Finding::key("5.4")]
        );
        assert!(canonical.type2_incorrect.is_empty());
        assert!(canonical.type3_extraneous.is_empty());
    }

    #[test]
    fn wrapped_type2_keeps_structured_items_unchanged() {
        let item = json!({"section": "3.1", "files": ["x.py"], "reasoning": "wrong default"});
        let raw = json!({"misalignments": [item.clone()]});

        let canonical = normalize(&raw, MisalignmentCategory::IncorrectImplementation)
            .expect("wrapped record should normalize");
        let expected = Finding::from_value(&item).expect("item should convert");
        assert_eq!(canonical.type2_incorrect, vec![expected]);
    }

    #[test]
    fn wrapped_type3_projects_files() {
        let raw = json!({
            "misalignments": [{"file": "src/extra.py"}, {"section": "1.0"}]
        });
        let canonical = normalize(&raw, MisalignmentCategory::ExtraneousCode)
            .expect("wrapped record should normalize");
        assert_eq!(canonical.type3_extraneous, vec![Finding::key("src/extra.py")]);
    }

    #[test]
    fn wrapped_type3_expands_feature_file_lists() {
        let raw = json!({
            "misalignments": [{"feature": "telemetry", "files": ["b.py", "a.py"]}]
        });
        let canonical = normalize(&raw, MisalignmentCategory::ExtraneousCode)
            .expect("wrapped record should normalize");
        assert_eq!(
            canonical.type3_extraneous,
            vec![Finding::key("a.py"), Finding::key("b.py")]
        );
    }

    #[test]
    fn wrapped_type3_ignores_file_lists_without_a_feature() {
        let raw = json!({
            "misalignments": [{"section": "2.1", "files": ["a.py", "b.py"]}]
        });
        let canonical = normalize(&raw, MisalignmentCategory::ExtraneousCode)
            .expect("wrapped record should normalize");
        assert!(canonical.type3_extraneous.is_empty());
    }

    #[test]
    fn record_without_known_keys_normalizes_to_empty() {
        let canonical = normalize(&json!({"notes": "nothing"}), MisalignmentCategory::MissingImplementation)
            .expect("unknown object should still normalize");
        assert_eq!(canonical, CanonicalPredictions::default());
    }

    #[test]
    fn non_object_is_malformed() {
        let error = normalize(&json!(["3.1"]), MisalignmentCategory::MissingImplementation)
            .expect_err("arrays are not prediction records");
        assert!(matches!(error, ScoringError::MalformedInput(_)));
        assert!(error.to_string().contains("array"), "unexpected error: {error}");
    }

    #[test]
    fn classify_decides_shape_once() {
        let wrapped = RawPrediction::classify(&json!({"misalignments": [{"file": "a"}]}))
            .expect("wrapped record should classify");
        assert!(matches!(wrapped, RawPrediction::Wrapped(ref items) if items.len() == 1));

        let combined = RawPrediction::classify(&json!({"type3_extraneous": "oops"}))
            .expect("combined record should classify");
        assert_eq!(combined, RawPrediction::Combined(CanonicalPredictions::default()));
    }
}
