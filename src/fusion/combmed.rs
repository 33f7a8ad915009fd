use super::{degenerate, normalize, rank_by_score, FusionOutcome, NormalizationMethod, ScoreMatrix};

/// CombMED: median of the row's normalized scores
///
/// Only columns where the row has a present score take part; a row scored
/// by no surviving column has median 0.
pub fn combmed(matrix: &ScoreMatrix, normalization: NormalizationMethod) -> FusionOutcome {
    if let Some(outcome) = degenerate(matrix) {
        return outcome;
    }

    let mut per_row: Vec<Vec<f64>> = vec![Vec::new(); matrix.rows()];

    for column in matrix.informative_columns() {
        for (collected, score) in per_row.iter_mut().zip(normalize(column, normalization)) {
            if let Some(score) = score {
                collected.push(score);
            }
        }
    }

    let medians = per_row.into_iter().map(median).collect();
    rank_by_score(medians)
}

/// Median of a list; even-length lists average the two central values
pub fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;

    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(vec![]), 0.0);
        assert_eq!(median(vec![0.3]), 0.3);
        assert_eq!(median(vec![0.9, 0.1, 0.5]), 0.5);
        assert_eq!(median(vec![0.8, 0.2, 0.4, 0.6]), 0.5);
    }

    #[test]
    fn test_combmed_excludes_missing() {
        // Row 0 is only scored by the first column; nulls never count.
        let m = ScoreMatrix::new(vec![
            vec![Some(10.0), Some(5.0), Some(2.0)],
            vec![None, Some(4.0), Some(8.0)],
            vec![None, Some(2.0), Some(1.0)],
        ])
        .unwrap();
        let out = combmed(&m, NormalizationMethod::Max);
        let rows = out.rows().unwrap();

        assert_eq!(rows[0].score, 1.0);
        // row 1: [0.5, 0.5, 1.0] -> 0.5
        assert_eq!(rows[1].score, 0.5);
        // row 2: [0.2, 1.0, 0.5] -> 0.5
        assert_eq!(rows[2].score, 0.5);
        assert_eq!(out.order(), vec![0, 1, 2]);
    }

    #[test]
    fn test_combmed_row_without_scores() {
        let m = ScoreMatrix::new(vec![
            vec![Some(4.0), Some(2.0), None],
            vec![Some(1.0), Some(3.0), None],
        ])
        .unwrap();
        let out = combmed(&m, NormalizationMethod::Max);
        let rows = out.rows().unwrap();
        assert_eq!(rows[2].score, 0.0);
        assert_eq!(rows[2].rank, 3);
    }
}
