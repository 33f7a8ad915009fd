//! Rank fusion over multiple per-row scoring signals
//!
//! Combines S independent score columns for N rows (lexical score, vector
//! similarity, arbitrary numeric signals) into one ranking. Each algorithm
//! produces, per row, a 1-based rank and the diagnostic score the rank was
//! derived from.
//!
//! | Method | Normalization | Missing values |
//! |---|---|---|
//! | CombSUM | MinMax | count as 0 |
//! | CombMNZ | MinMax | count as 0, sum scaled by hits |
//! | CombANZ | MinMax | count as 0, sum divided by hits |
//! | CombMED | Max | excluded from the median |
//! | RRF | none (raw ranks) | excluded from the column's ranking |
//!
//! Shared rules: zero rows yield an empty ranking, a single row yields
//! [`FusionOutcome::Undefined`], and a column where every row holds the same
//! value (or every row is missing) carries no signal and is dropped before
//! fusion.

mod comb;
mod combmed;
mod matrix;
mod normalizer;
mod rrf;

pub use comb::{combanz, combmnz, combsum};
pub use combmed::{combmed, median};
pub use matrix::ScoreMatrix;
pub use normalizer::{normalize, NormalizationMethod};
pub use rrf::{column_ranks, reciprocal_rank_fusion};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// RRF smoothing constant
pub const DEFAULT_RRF_K: f64 = 60.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    #[error("fusion input: column {column} is not numeric (row {row} holds {found})")]
    NonNumericColumn {
        column: usize,
        row: usize,
        found: String,
    },

    #[error("fusion input: column {column} has {actual} rows, expected {expected}")]
    RaggedColumns {
        column: usize,
        expected: usize,
        actual: usize,
    },

    #[error("fusion input: unknown fusion method '{0}'")]
    UnknownMethod(String),
}

/// Fusion algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FusionMethod {
    #[value(name = "combsum")]
    CombSum,
    #[value(name = "combmnz")]
    CombMnz,
    #[value(name = "combanz")]
    CombAnz,
    #[value(name = "combmed")]
    CombMed,
    #[value(name = "rrf")]
    Rrf,
}

impl FusionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            FusionMethod::CombSum => "combsum",
            FusionMethod::CombMnz => "combmnz",
            FusionMethod::CombAnz => "combanz",
            FusionMethod::CombMed => "combmed",
            FusionMethod::Rrf => "rrf",
        }
    }
}

impl FromStr for FusionMethod {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "combsum" => Ok(FusionMethod::CombSum),
            "combmnz" => Ok(FusionMethod::CombMnz),
            "combanz" => Ok(FusionMethod::CombAnz),
            "combmed" => Ok(FusionMethod::CombMed),
            "rrf" => Ok(FusionMethod::Rrf),
            other => Err(FusionError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for FusionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which raw value gets rank 1 when a column is ranked for RRF
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreOrder {
    /// Smallest value ranks first (the column already holds ranks or distances)
    #[default]
    Ascending,
    /// Largest value ranks first (the column holds relevance scores)
    Descending,
}

/// Fusion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// RRF K constant (typically 60)
    pub rrf_k: f64,

    /// Rank direction for RRF columns
    pub rrf_order: ScoreOrder,

    /// Normalization for CombSUM, CombMNZ and CombANZ
    pub combsum_normalization: NormalizationMethod,

    /// Normalization for CombMED
    pub combmed_normalization: NormalizationMethod,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: DEFAULT_RRF_K,
            rrf_order: ScoreOrder::Ascending,
            combsum_normalization: NormalizationMethod::MinMax,
            combmed_normalization: NormalizationMethod::Max,
        }
    }
}

/// One row's fusion result
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FusedRow {
    /// Position of the row in the input
    pub index: usize,
    /// 1-based rank, 1 = most relevant
    pub rank: usize,
    /// Value the rank was derived from (sum, median or RRF sum)
    pub score: f64,
}

impl fmt::Display for FusedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.6})", self.rank, self.score)
    }
}

/// Result of fusing one row-group
#[derive(Debug, Clone, PartialEq)]
pub enum FusionOutcome {
    /// Ranked rows in input order (empty for zero rows)
    Ranked(Vec<FusedRow>),
    /// A single row has no relative rank
    Undefined,
}

impl FusionOutcome {
    pub fn rows(&self) -> Option<&[FusedRow]> {
        match self {
            FusionOutcome::Ranked(rows) => Some(rows),
            FusionOutcome::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, FusionOutcome::Undefined)
    }

    /// Row indices ordered by rank (best first)
    pub fn order(&self) -> Vec<usize> {
        let mut rows: Vec<&FusedRow> = self.rows().unwrap_or_default().iter().collect();
        rows.sort_by_key(|row| row.rank);
        rows.into_iter().map(|row| row.index).collect()
    }
}

/// Run the selected fusion algorithm
pub fn fuse(matrix: &ScoreMatrix, method: FusionMethod, config: &FusionConfig) -> FusionOutcome {
    tracing::debug!(
        "Fusing {} rows x {} columns with {}",
        matrix.rows(),
        matrix.column_count(),
        method
    );

    match method {
        FusionMethod::CombSum => combsum(matrix, config.combsum_normalization),
        FusionMethod::CombMnz => combmnz(matrix, config.combsum_normalization),
        FusionMethod::CombAnz => combanz(matrix, config.combsum_normalization),
        FusionMethod::CombMed => combmed(matrix, config.combmed_normalization),
        FusionMethod::Rrf => reciprocal_rank_fusion(matrix, config.rrf_k, config.rrf_order),
    }
}

/// Zero rows rank to nothing and one row cannot be ranked at all.
fn degenerate(matrix: &ScoreMatrix) -> Option<FusionOutcome> {
    match matrix.rows() {
        0 => Some(FusionOutcome::Ranked(Vec::new())),
        1 => Some(FusionOutcome::Undefined),
        _ => None,
    }
}

/// Assign ranks by descending score; ties keep input order.
fn rank_by_score(scores: Vec<f64>) -> FusionOutcome {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut rows: Vec<FusedRow> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| FusedRow {
            index,
            rank: 0,
            score,
        })
        .collect();

    for (position, index) in order.into_iter().enumerate() {
        rows[index].rank = position + 1;
    }

    FusionOutcome::Ranked(rows)
}
