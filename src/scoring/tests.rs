use serde_json::json;

use super::*;
use crate::model::{CategoryScore, Scores};

const EPS: f64 = 1e-12;

fn single(scores: Scores) -> CategoryScore {
    match scores {
        Scores::Single(score) => score,
        Scores::Combined(_) => panic!("expected a single-category score"),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn key_categories_score_partial_overlap() {
    for (scope, ground_truth) in [
        (TestScope::Type1Missing, json!({"expected_sections": ["A", "C"]})),
        (TestScope::Type3Extraneous, json!({"expected_files": ["A", "C"]})),
    ] {
        let ground_truth = GroundTruthRecord::from_value(&ground_truth, scope)
            .expect("ground truth should parse");
        let prediction = json!({
            "type1_missing": ["A", "B"],
            "type2_incorrect": [],
            "type3_extraneous": ["A", "B"]
        });

        let score = single(score_run(&prediction, &ground_truth, scope).expect("run should score"));
        assert_eq!(score.true_positives, strings(&["A"]));
        assert_eq!(score.false_positives, strings(&["B"]));
        assert_eq!(score.false_negatives, strings(&["C"]));
        assert!((score.metrics.precision - 0.5).abs() < EPS);
        assert!((score.metrics.recall - 0.5).abs() < EPS);
        assert!((score.metrics.f1 - 0.5).abs() < EPS);
        assert!((score.metrics.points - 0.75).abs() < EPS);
    }
}

#[test]
fn type2_file_overlap_is_a_full_match() {
    let ground_truth = GroundTruthRecord::from_value(
        &json!({"ground_truth": {"misalignments": [{"section": "3.1", "files": ["x.py", "y.py"]}]}}),
        TestScope::Type2Incorrect,
    )
    .expect("ground truth should parse");
    let prediction = json!({"misalignments": [{"section": "3.1", "files": ["x.py"]}]});

    let score = single(
        score_run(&prediction, &ground_truth, TestScope::Type2Incorrect).expect("run should score"),
    );
    assert_eq!(score.true_positives, strings(&["3.1"]));
    assert!(score.false_positives.is_empty());
    assert!(score.false_negatives.is_empty());
    assert_eq!(
        (score.metrics.precision, score.metrics.recall, score.metrics.f1),
        (1.0, 1.0, 1.0)
    );
}

#[test]
fn type2_without_file_overlap_is_both_false_positive_and_negative() {
    let ground_truth = GroundTruthRecord::from_value(
        &json!({"ground_truth": {"misalignments": [{"section": "3.1", "files": ["x.py", "y.py"]}]}}),
        TestScope::Type2Incorrect,
    )
    .expect("ground truth should parse");
    let prediction = json!({"misalignments": [{"section": "3.1", "files": ["z.py"]}]});

    let score = single(
        score_run(&prediction, &ground_truth, TestScope::Type2Incorrect).expect("run should score"),
    );
    assert_eq!(score.false_positives, strings(&["3.1"]));
    assert_eq!(score.false_negatives, strings(&["3.1"]));
    assert_eq!(
        (score.metrics.precision, score.metrics.recall, score.metrics.f1),
        (0.0, 0.0, 0.0)
    );
}

#[test]
fn control_branch_with_nothing_to_find_is_perfect() {
    let ground_truth = GroundTruthRecord::from_value(
        &json!({
            "test_branch": "control_perfect",
            "test_type": "combined_all_types",
            "ground_truth": {
                "type1_missing": [],
                "type2_incorrect": [],
                "type3_extraneous": []
            }
        }),
        TestScope::CombinedAllTypes,
    )
    .expect("ground truth should parse");
    let prediction = json!({"type1_missing": [], "type2_incorrect": [], "type3_extraneous": []});

    let scores = score_run(&prediction, &ground_truth, TestScope::CombinedAllTypes)
        .expect("run should score");
    let Scores::Combined(scores) = scores else {
        panic!("combined scope should produce combined scores");
    };
    assert_eq!(scores.combined.avg_f1, 1.0);
    assert_eq!(scores.combined.total_points, 0.0);
    assert_eq!(scores.combined.category_count, 3);
    for score in [&scores.type1, &scores.type2, &scores.type3] {
        let score = score.as_ref().expect("every category should be scored");
        assert_eq!(score.metrics.precision, 1.0);
        assert_eq!(score.metrics.recall, 1.0);
        assert_eq!(score.metrics.points, 0.0);
    }
}

#[test]
fn every_category_is_perfect_when_both_sides_are_empty() {
    for scope in [
        TestScope::Type1Missing,
        TestScope::Type2Incorrect,
        TestScope::Type3Extraneous,
    ] {
        let ground_truth = GroundTruthRecord::from_value(&json!({}), scope)
            .expect("empty ground truth should parse");
        let score = single(
            score_run(&json!({"misalignments": []}), &ground_truth, scope)
                .expect("run should score"),
        );
        assert_eq!(score.metrics.f1, 1.0, "scope {scope}");
        assert_eq!(score.metrics.points, 0.0, "scope {scope}");
    }
}

#[test]
fn combined_total_points_is_exact_sum_of_categories() {
    let ground_truth = GroundTruthRecord::from_value(
        &json!({
            "type1_missing": ["2.1", "2.2"],
            "type2_incorrect": [{"section": "3.1", "files": ["a.py"]}],
            "type3_extraneous": ["extra.py"]
        }),
        TestScope::CombinedAllTypes,
    )
    .expect("ground truth should parse");
    let prediction = json!({
        "type1_missing": ["2.1", "9.9"],
        "type2_incorrect": [{"section": "3.1", "files": ["a.py"]}, {"section": "4.0", "files": ["b.py"]}],
        "type3_extraneous": ["noise.py", "more.py"]
    });

    let Scores::Combined(scores) =
        score_run(&prediction, &ground_truth, TestScope::CombinedAllTypes).expect("run should score")
    else {
        panic!("combined scope should produce combined scores");
    };

    let parts: f64 = [&scores.type1, &scores.type2, &scores.type3]
        .into_iter()
        .map(|score| score.as_ref().expect("category should be present").metrics.points)
        .sum();
    assert_eq!(scores.combined.total_points, parts);
    assert_eq!(scores.combined.tp_count, 2);
    assert_eq!(scores.combined.fp_count, 4);
    assert_eq!(scores.combined.fn_count, 2);
}

#[test]
fn combined_run_skips_categories_absent_from_ground_truth() {
    let ground_truth = GroundTruthRecord::from_value(
        &json!({"ground_truth": {"type1_missing": ["A"]}}),
        TestScope::CombinedAllTypes,
    )
    .expect("ground truth should parse");
    let prediction = json!({"type1_missing": ["A"], "type3_extraneous": ["stray.py"]});

    let Scores::Combined(scores) =
        score_run(&prediction, &ground_truth, TestScope::CombinedAllTypes).expect("run should score")
    else {
        panic!("combined scope should produce combined scores");
    };
    assert!(scores.type3.is_none());
    assert_eq!(scores.combined.category_count, 1);
    assert_eq!(scores.combined.avg_f1, 1.0);
}

#[test]
fn combined_ground_truth_without_categories_is_rejected() {
    let ground_truth = GroundTruthRecord::from_value(&json!({}), TestScope::CombinedAllTypes)
        .expect("object should parse");
    let error = score_run(&json!({}), &ground_truth, TestScope::CombinedAllTypes)
        .expect_err("nothing to score");
    assert_eq!(error.kind(), "malformed_input");
}

#[test]
fn non_object_prediction_is_malformed() {
    let ground_truth = GroundTruthRecord::from_value(&json!({"expected_sections": []}), TestScope::Type1Missing)
        .expect("ground truth should parse");
    let error = score_run(&json!("oops"), &ground_truth, TestScope::Type1Missing)
        .expect_err("string prediction should be rejected");
    assert!(matches!(error, ScoringError::MalformedInput(_)));
}
