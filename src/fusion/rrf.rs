//! Reciprocal Rank Fusion (Cormack et al., SIGIR 2009)

use super::{degenerate, rank_by_score, FusionOutcome, ScoreMatrix, ScoreOrder};

/// Rank the present values of one column, 1-based
///
/// Missing entries get no rank. Ties are broken by input order.
pub fn column_ranks(column: &[Option<f64>], order: ScoreOrder) -> Vec<Option<usize>> {
    let mut present: Vec<(usize, f64)> = column
        .iter()
        .enumerate()
        .filter_map(|(row, value)| value.map(|v| (row, v)))
        .collect();

    match order {
        ScoreOrder::Ascending => present.sort_by(|a, b| a.1.total_cmp(&b.1)),
        ScoreOrder::Descending => present.sort_by(|a, b| b.1.total_cmp(&a.1)),
    }

    let mut ranks = vec![None; column.len()];
    for (position, (row, _)) in present.into_iter().enumerate() {
        ranks[row] = Some(position + 1);
    }
    ranks
}

/// RRF: score(row) = sum over columns of 1 / (k + rank)
///
/// # Arguments
/// * `matrix` - Raw (non-normalized) score columns
/// * `k` - Smoothing constant (typically 60)
/// * `order` - Which end of a column ranks first
pub fn reciprocal_rank_fusion(matrix: &ScoreMatrix, k: f64, order: ScoreOrder) -> FusionOutcome {
    if let Some(outcome) = degenerate(matrix) {
        return outcome;
    }

    let mut scores = vec![0.0; matrix.rows()];

    for column in matrix.informative_columns() {
        for (score, rank) in scores.iter_mut().zip(column_ranks(column, order)) {
            if let Some(rank) = rank {
                *score += 1.0 / (k + rank as f64);
            }
        }
    }

    rank_by_score(scores)
}
