use rankfuse::fusion::{
    fuse, FusionConfig, FusionError, FusionMethod, FusionOutcome, ScoreMatrix, ScoreOrder,
};
use serde_json::{json, Value};

fn matrix(columns: Vec<Vec<Value>>) -> ScoreMatrix {
    ScoreMatrix::from_json_columns(&columns).unwrap()
}

fn scores(outcome: &FusionOutcome) -> Vec<f64> {
    outcome.rows().unwrap().iter().map(|r| r.score).collect()
}

fn ranks(outcome: &FusionOutcome) -> Vec<usize> {
    outcome.rows().unwrap().iter().map(|r| r.rank).collect()
}

#[test]
fn test_rrf_hybrid_search_example() {
    // bm25 and vector-similarity positions for five documents
    let m = matrix(vec![
        vec![json!(1), json!(2), json!(3), json!(4), json!(5)],
        vec![json!(4), json!(2), json!(1), json!(5), json!(3)],
    ]);
    let out = fuse(&m, FusionMethod::Rrf, &FusionConfig::default());

    let expected = [
        1.0 / 61.0 + 1.0 / 64.0,
        2.0 / 62.0,
        1.0 / 63.0 + 1.0 / 61.0,
        1.0 / 64.0 + 1.0 / 65.0,
        1.0 / 65.0 + 1.0 / 63.0,
    ];
    for (got, want) in scores(&out).iter().zip(expected) {
        assert!((got - want).abs() < 1e-12);
    }
    assert_eq!(out.order(), vec![2, 1, 0, 4, 3]);
}

#[test]
fn test_rrf_descending_config() {
    let m = matrix(vec![
        vec![json!(0.9), json!(0.1), json!(0.5)],
        vec![json!(0.8), json!(0.3), json!(0.2)],
    ]);
    let config = FusionConfig {
        rrf_order: ScoreOrder::Descending,
        ..Default::default()
    };
    let out = fuse(&m, FusionMethod::Rrf, &config);
    assert_eq!(out.order()[0], 0);
}

#[test]
fn test_combsum_ranks_consistent_winner_first() {
    let m = matrix(vec![
        vec![json!(10.0), json!(5.0), json!(1.0)],
        vec![json!(0.9), json!(0.7), json!(0.1)],
    ]);
    let out = fuse(&m, FusionMethod::CombSum, &FusionConfig::default());
    assert_eq!(ranks(&out), vec![1, 2, 3]);

    let s = scores(&out);
    assert!((s[0] - 2.0).abs() < 1e-12);
    assert_eq!(s[2], 0.0);
}

#[test]
fn test_combsum_null_counts_as_zero() {
    let m = matrix(vec![
        vec![json!(1.0), Value::Null, json!(3.0)],
        vec![json!(2.0), json!(4.0), json!(0.0)],
    ]);
    let out = fuse(&m, FusionMethod::CombSum, &FusionConfig::default());
    // col0 -> [0, -, 1]; col1 -> [0.5, 1, 0]
    assert_eq!(scores(&out), vec![0.5, 1.0, 1.0]);
    assert_eq!(ranks(&out), vec![3, 1, 2]);
}

#[test]
fn test_combmnz_and_combanz_weight_by_hits() {
    let m = matrix(vec![
        vec![json!(4.0), json!(0.0), Value::Null],
        vec![json!(2.0), Value::Null, json!(0.0)],
        vec![Value::Null, json!(1.0), json!(0.0)],
    ]);
    let config = FusionConfig::default();

    // normalized: col0 [1, 0, -], col1 [1, -, 0], col2 [-, 1, 0]
    let mnz = fuse(&m, FusionMethod::CombMnz, &config);
    assert_eq!(scores(&mnz), vec![4.0, 2.0, 0.0]);

    let anz = fuse(&m, FusionMethod::CombAnz, &config);
    assert_eq!(scores(&anz), vec![1.0, 0.5, 0.0]);
}

#[test]
fn test_combmed_uses_max_normalization() {
    let m = matrix(vec![
        vec![json!(10.0), json!(5.0), json!(2.0)],
        vec![json!(1.0), json!(4.0), json!(2.0)],
        vec![json!(3.0), json!(6.0), Value::Null],
    ]);
    let out = fuse(&m, FusionMethod::CombMed, &FusionConfig::default());

    // col0 / 10, col1 / 4, col2 / 6
    let s = scores(&out);
    assert!((s[0] - 0.5).abs() < 1e-12);
    assert!((s[1] - 1.0).abs() < 1e-12);
    assert!((s[2] - 0.35).abs() < 1e-12);
    assert_eq!(ranks(&out), vec![2, 1, 3]);
}

#[test]
fn test_uninformative_columns_are_ignored() {
    let base = vec![json!(3.0), json!(1.0), json!(2.0)];
    let with_constant = matrix(vec![base.clone(), vec![json!(7.0); 3]]);
    let with_nulls = matrix(vec![base.clone(), vec![Value::Null; 3]]);
    let alone = matrix(vec![base]);

    for method in [
        FusionMethod::CombSum,
        FusionMethod::CombMnz,
        FusionMethod::CombAnz,
        FusionMethod::CombMed,
        FusionMethod::Rrf,
    ] {
        let config = FusionConfig::default();
        let expected = fuse(&alone, method, &config);
        assert_eq!(fuse(&with_constant, method, &config), expected, "{}", method);
        assert_eq!(fuse(&with_nulls, method, &config), expected, "{}", method);
    }
}

#[test]
fn test_repeated_value_with_missing_rows_still_counts() {
    let base = vec![json!(1.0), json!(2.0), json!(1.5)];
    let partial = vec![json!(3.0), Value::Null, json!(3.0)];
    let both = matrix(vec![base.clone(), partial]);
    let alone = matrix(vec![base]);
    let config = FusionConfig::default();

    // col0 / 2 -> [0.5, 1, 0.75]; col1 / 3 -> [1, -, 1]
    let med = fuse(&both, FusionMethod::CombMed, &config);
    let s = scores(&med);
    assert!((s[0] - 0.75).abs() < 1e-12);
    assert!((s[1] - 1.0).abs() < 1e-12);
    assert!((s[2] - 0.875).abs() < 1e-12);
    assert_ne!(med, fuse(&alone, FusionMethod::CombMed, &config));

    let rrf = fuse(&both, FusionMethod::Rrf, &config);
    assert_ne!(rrf, fuse(&alone, FusionMethod::Rrf, &config));
}

#[test]
fn test_degenerate_row_counts() {
    let config = FusionConfig::default();
    for method in [FusionMethod::CombSum, FusionMethod::CombMed, FusionMethod::Rrf] {
        let empty = ScoreMatrix::new(vec![vec![], vec![]]).unwrap();
        assert_eq!(fuse(&empty, method, &config), FusionOutcome::Ranked(vec![]));

        let single = matrix(vec![vec![json!(0.4)], vec![json!(0.9)]]);
        assert!(fuse(&single, method, &config).is_undefined());
    }
}

#[test]
fn test_non_numeric_column_is_rejected() {
    let err = ScoreMatrix::from_json_columns(&[
        vec![json!(1.0), json!(2.0)],
        vec![json!(1.0), json!("two")],
    ])
    .unwrap_err();
    assert!(matches!(err, FusionError::NonNumericColumn { column: 1, row: 1, .. }));
}

#[test]
fn test_ragged_columns_are_rejected() {
    let err = ScoreMatrix::from_json_columns(&[vec![json!(1.0), json!(2.0)], vec![json!(1.0)]])
        .unwrap_err();
    assert!(matches!(err, FusionError::RaggedColumns { .. }));
}

#[test]
fn test_display_format() {
    let m = matrix(vec![vec![json!(1.0), json!(2.0)]]);
    let out = fuse(&m, FusionMethod::CombSum, &FusionConfig::default());
    let lines: Vec<String> = out.rows().unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(lines, vec!["2 (0.000000)", "1 (1.000000)"]);
}
