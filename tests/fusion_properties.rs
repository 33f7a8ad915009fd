use proptest::prelude::*;
use rankfuse::fusion::{
    combmed, combsum, fuse, normalize, FusionConfig, FusionMethod, NormalizationMethod,
    ScoreMatrix,
};

fn column(rows: usize) -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(prop::option::weighted(0.8, -1000.0..1000.0f64), rows)
}

fn score_matrix() -> impl Strategy<Value = ScoreMatrix> {
    (2usize..12, 1usize..5).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(column(rows), cols)
            .prop_map(|columns| ScoreMatrix::new(columns).unwrap())
    })
}

const METHODS: [FusionMethod; 5] = [
    FusionMethod::CombSum,
    FusionMethod::CombMnz,
    FusionMethod::CombAnz,
    FusionMethod::CombMed,
    FusionMethod::Rrf,
];

proptest! {
    #[test]
    fn max_normalization_is_idempotent(values in column(8)) {
        let once = normalize(&values, NormalizationMethod::Max);
        let twice = normalize(&once, NormalizationMethod::Max);
        for (a, b) in once.iter().zip(&twice) {
            match (a, b) {
                (Some(a), Some(b)) => prop_assert!((a - b).abs() < 1e-12),
                (None, None) => {}
                _ => prop_assert!(false, "presence changed"),
            }
        }
    }

    #[test]
    fn minmax_output_lies_in_unit_range(values in column(8)) {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let spread = present.iter().any(|v| Some(v) != present.first());
        prop_assume!(spread);

        let out = normalize(&values, NormalizationMethod::MinMax);
        for value in out.iter().flatten() {
            prop_assert!((0.0..=1.0).contains(value));
        }
    }

    #[test]
    fn ranks_are_a_permutation(matrix in score_matrix()) {
        for method in METHODS {
            let outcome = fuse(&matrix, method, &FusionConfig::default());
            let mut ranks: Vec<usize> = outcome.rows().unwrap().iter().map(|r| r.rank).collect();
            ranks.sort_unstable();
            prop_assert_eq!(ranks, (1..=matrix.rows()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn raising_a_score_never_lowers_the_row(
        columns in (3usize..9, 2usize..5).prop_flat_map(|(rows, cols)| {
            prop::collection::vec(
                prop::collection::vec(prop::option::weighted(0.8, -100.0..100.0f64), rows),
                cols,
            )
        }),
        pick in any::<prop::sample::Index>(),
        bump in 0.1..50.0f64,
    ) {
        let cells: Vec<(usize, usize)> = columns
            .iter()
            .enumerate()
            .flat_map(|(c, column)| {
                column.iter().enumerate().filter(|(_, v)| v.is_some()).map(move |(r, _)| (c, r))
            })
            .collect();
        prop_assume!(!cells.is_empty());
        let (col, row) = *pick.get(&cells);

        let before = combsum(&ScoreMatrix::new(columns.clone()).unwrap(), NormalizationMethod::MinMax);
        let mut raised = columns;
        raised[col][row] = raised[col][row].map(|v| v + bump);
        let after = combsum(&ScoreMatrix::new(raised).unwrap(), NormalizationMethod::MinMax);

        let before = before.rows().unwrap();
        let after = after.rows().unwrap();
        for other in 0..before.len() {
            if other != row && before[row].score > before[other].score + 1e-9 {
                prop_assert!(
                    after[row].rank < after[other].rank,
                    "row {} fell behind row {}", row, other
                );
            }
        }
    }

    #[test]
    fn combmed_ignores_missing_entries(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        prop_assume!((a - b).abs() > 1e-6);

        // Row 2 is missing from the second column; its median comes from the first alone
        let first = vec![Some(a), Some(b), Some(a.max(b))];
        let second = vec![Some(b), Some(a), None];
        let matrix = ScoreMatrix::new(vec![first.clone(), second]).unwrap();
        let outcome = combmed(&matrix, NormalizationMethod::Max);

        let alone = normalize(&first, NormalizationMethod::Max);
        let row2 = outcome.rows().unwrap()[2].score;
        prop_assert!((row2 - alone[2].unwrap()).abs() < 1e-12);
    }

    #[test]
    fn constant_columns_never_change_the_result(matrix_columns in (2usize..10).prop_flat_map(|rows| {
        (prop::collection::vec(column(rows), 1..4), -10.0..10.0f64, Just(rows))
    })) {
        let (columns, constant, rows) = matrix_columns;
        let plain = ScoreMatrix::new(columns.clone()).unwrap();

        let mut padded_columns = columns;
        padded_columns.push(vec![Some(constant); rows]);
        let padded = ScoreMatrix::new(padded_columns).unwrap();

        for method in METHODS {
            let config = FusionConfig::default();
            prop_assert_eq!(fuse(&plain, method, &config), fuse(&padded, method, &config));
        }
    }

    #[test]
    fn one_row_is_never_ranked(value in -10.0..10.0f64) {
        let matrix = ScoreMatrix::new(vec![vec![Some(value)], vec![None]]).unwrap();
        for method in METHODS {
            prop_assert!(fuse(&matrix, method, &FusionConfig::default()).is_undefined());
        }
    }
}
