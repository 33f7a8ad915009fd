//! CombSUM family (Fox & Shaw, "Combination of Multiple Searches", 1993)

use super::{degenerate, normalize, rank_by_score, FusionOutcome, NormalizationMethod, ScoreMatrix};

/// Per-row sum of normalized scores and the number of columns that scored it.
fn sums_and_hits(matrix: &ScoreMatrix, normalization: NormalizationMethod) -> Vec<(f64, usize)> {
    let mut totals = vec![(0.0, 0); matrix.rows()];

    for column in matrix.informative_columns() {
        if normalization == NormalizationMethod::MinMax && !has_spread(column) {
            tracing::debug!("Skipping score column without spread under min-max normalization");
            continue;
        }
        for (total, score) in totals.iter_mut().zip(normalize(column, normalization)) {
            if let Some(score) = score {
                total.0 += score;
                total.1 += 1;
            }
        }
    }

    totals
}

/// Whether the present values of a column differ from one another
fn has_spread(column: &[Option<f64>]) -> bool {
    let mut present = column.iter().flatten();
    match present.next() {
        Some(first) => present.any(|value| value != first),
        None => false,
    }
}

/// CombSUM: sum of normalized scores, a missing score contributes 0
pub fn combsum(matrix: &ScoreMatrix, normalization: NormalizationMethod) -> FusionOutcome {
    if let Some(outcome) = degenerate(matrix) {
        return outcome;
    }

    let scores = sums_and_hits(matrix, normalization)
        .into_iter()
        .map(|(sum, _)| sum)
        .collect();

    rank_by_score(scores)
}

/// CombMNZ: CombSUM multiplied by the number of sources that scored the row
pub fn combmnz(matrix: &ScoreMatrix, normalization: NormalizationMethod) -> FusionOutcome {
    if let Some(outcome) = degenerate(matrix) {
        return outcome;
    }

    let scores = sums_and_hits(matrix, normalization)
        .into_iter()
        .map(|(sum, hits)| sum * hits as f64)
        .collect();

    rank_by_score(scores)
}

/// CombANZ: CombSUM divided by the number of sources that scored the row
pub fn combanz(matrix: &ScoreMatrix, normalization: NormalizationMethod) -> FusionOutcome {
    if let Some(outcome) = degenerate(matrix) {
        return outcome;
    }

    let scores = sums_and_hits(matrix, normalization)
        .into_iter()
        .map(|(sum, hits)| if hits == 0 { 0.0 } else { sum / hits as f64 })
        .collect();

    rank_by_score(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(columns: Vec<Vec<Option<f64>>>) -> ScoreMatrix {
        ScoreMatrix::new(columns).unwrap()
    }

    fn scores(outcome: &FusionOutcome) -> Vec<f64> {
        outcome.rows().unwrap().iter().map(|r| r.score).collect()
    }

    fn ranks(outcome: &FusionOutcome) -> Vec<usize> {
        outcome.rows().unwrap().iter().map(|r| r.rank).collect()
    }

    #[test]
    fn test_combsum_basic() {
        // bm25 normalizes to [0, 0.5, 1], vector to [1, 0, 0.5]
        let m = matrix(vec![
            vec![Some(2.0), Some(4.0), Some(6.0)],
            vec![Some(0.9), Some(0.5), Some(0.7)],
        ]);
        let out = combsum(&m, NormalizationMethod::MinMax);
        let s = scores(&out);
        assert!((s[0] - 1.0).abs() < 1e-12);
        assert!((s[1] - 0.5).abs() < 1e-12);
        assert!((s[2] - 1.5).abs() < 1e-12);
        assert_eq!(ranks(&out), vec![2, 3, 1]);
    }

    #[test]
    fn test_combsum_missing_counts_as_zero() {
        let m = matrix(vec![
            vec![Some(1.0), Some(3.0), Some(2.0)],
            vec![None, Some(1.0), Some(3.0)],
        ]);
        let out = combsum(&m, NormalizationMethod::MinMax);
        let s = scores(&out);
        assert_eq!(s[0], 0.0);
        assert_eq!(s[1], 1.0);
        assert_eq!(s[2], 1.5);
    }

    #[test]
    fn test_combsum_ties_keep_input_order() {
        let m = matrix(vec![
            vec![Some(1.0), Some(0.0), Some(1.0)],
            vec![Some(0.0), Some(0.0), Some(0.0)],
        ]);
        assert_eq!(ranks(&combsum(&m, NormalizationMethod::MinMax)), vec![1, 3, 2]);
    }

    #[test]
    fn test_constant_column_is_ignored() {
        let base = matrix(vec![vec![Some(5.0), Some(1.0), Some(3.0)]]);
        let with_constant = matrix(vec![
            vec![Some(5.0), Some(1.0), Some(3.0)],
            vec![Some(7.0), Some(7.0), Some(7.0)],
        ]);
        assert_eq!(
            combsum(&base, NormalizationMethod::MinMax),
            combsum(&with_constant, NormalizationMethod::MinMax)
        );
    }

    #[test]
    fn test_partial_constant_column_adds_nothing_under_minmax() {
        let base = matrix(vec![vec![Some(5.0), Some(1.0), Some(3.0)]]);
        let with_partial = matrix(vec![
            vec![Some(5.0), Some(1.0), Some(3.0)],
            vec![Some(7.0), None, Some(7.0)],
        ]);
        assert_eq!(
            combsum(&base, NormalizationMethod::MinMax),
            combsum(&with_partial, NormalizationMethod::MinMax)
        );
        assert_eq!(
            combmnz(&base, NormalizationMethod::MinMax),
            combmnz(&with_partial, NormalizationMethod::MinMax)
        );
    }

    #[test]
    fn test_combmnz_rewards_overlap() {
        let m = matrix(vec![
            vec![Some(1.0), Some(0.0), None],
            vec![Some(1.0), None, Some(0.0)],
            vec![None, Some(1.0), Some(0.0)],
        ]);
        let out = combmnz(&m, NormalizationMethod::MinMax);
        // row 0: (1 + 1) * 2, row 1: (0 + 1) * 2, row 2: 0
        assert_eq!(scores(&out), vec![4.0, 2.0, 0.0]);
        assert_eq!(ranks(&out), vec![1, 2, 3]);
    }

    #[test]
    fn test_combanz_averages_hits() {
        let m = matrix(vec![
            vec![Some(1.0), Some(0.0), None],
            vec![None, Some(1.0), Some(0.0)],
        ]);
        let out = combanz(&m, NormalizationMethod::MinMax);
        assert_eq!(scores(&out), vec![1.0, 0.5, 0.0]);
    }
}
