//! Per-column score normalization

use serde::{Deserialize, Serialize};

/// Rescaling policy applied to each score column before fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Divide by the largest absolute value
    Max,
    /// Map the column onto [0, 1]
    MinMax,
}

/// Normalize a score column element-wise
///
/// Missing entries pass through untouched and take no part in the min/max
/// computation. A column that cannot be rescaled (max of zero for `Max`,
/// `max == min` for `MinMax`) is returned unchanged.
pub fn normalize(scores: &[Option<f64>], method: NormalizationMethod) -> Vec<Option<f64>> {
    let present = scores.iter().flatten().copied();

    match method {
        NormalizationMethod::Max => {
            let max = present.map(f64::abs).fold(0.0_f64, f64::max);
            if max == 0.0 {
                return scores.to_vec();
            }
            scores.iter().map(|s| s.map(|x| x / max)).collect()
        }
        NormalizationMethod::MinMax => {
            let (min, max) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });
            if max <= min {
                return scores.to_vec();
            }
            let range = max - min;
            scores.iter().map(|s| s.map(|x| (x - min) / range)).collect()
        }
    }
}
