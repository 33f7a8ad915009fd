use super::FusionError;
use serde_json::Value;

/// Raw per-row scores from S independent sources
///
/// Stored column-major: one `Vec<Option<f64>>` per scoring source, each of
/// length N. `None` marks a row the source did not score, which is distinct
/// from a score of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    rows: usize,
    columns: Vec<Vec<Option<f64>>>,
}

impl ScoreMatrix {
    /// Build a matrix from score columns
    ///
    /// NaN entries are treated as missing.
    ///
    /// # Errors
    /// `RaggedColumns` if the columns differ in length.
    pub fn new(columns: Vec<Vec<Option<f64>>>) -> Result<Self, FusionError> {
        let rows = columns.first().map(Vec::len).unwrap_or(0);

        for (column, values) in columns.iter().enumerate() {
            if values.len() != rows {
                return Err(FusionError::RaggedColumns {
                    column,
                    expected: rows,
                    actual: values.len(),
                });
            }
        }

        let columns = columns
            .into_iter()
            .map(|values| {
                values
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect()
            })
            .collect();

        Ok(Self { rows, columns })
    }

    /// Build a matrix from host-supplied JSON columns
    ///
    /// `null` is a missing score; any other non-numeric value rejects the
    /// whole column.
    pub fn from_json_columns(columns: &[Vec<Value>]) -> Result<Self, FusionError> {
        let mut parsed = Vec::with_capacity(columns.len());

        for (column, values) in columns.iter().enumerate() {
            let mut scores = Vec::with_capacity(values.len());
            for (row, value) in values.iter().enumerate() {
                let score = match value {
                    Value::Null => None,
                    Value::Number(n) => n.as_f64(),
                    other => {
                        return Err(FusionError::NonNumericColumn {
                            column,
                            row,
                            found: other.to_string(),
                        })
                    }
                };
                scores.push(score);
            }
            parsed.push(scores);
        }

        Self::new(parsed)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&[Option<f64>]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Columns that can discriminate between rows
    ///
    /// A column is skipped when every row holds the same value or every row
    /// is missing. A column mixing one repeated value with missing entries
    /// still separates scored rows from unscored ones and is kept.
    pub fn informative_columns(&self) -> impl Iterator<Item = &[Option<f64>]> {
        self.columns.iter().enumerate().filter_map(|(index, column)| {
            if is_informative(column) {
                Some(column.as_slice())
            } else {
                tracing::debug!("Skipping uninformative score column {}", index);
                None
            }
        })
    }
}

fn is_informative(column: &[Option<f64>]) -> bool {
    match column.first() {
        Some(first) => column.iter().any(|value| value != first),
        None => false,
    }
}
