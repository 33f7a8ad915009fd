//! Structured model response parsing

use super::ModelError;
use serde_json::Value;

/// Extract the `"ranking"` list of candidate ids, most relevant first
pub fn parse_ranking(response: &Value) -> Result<Vec<usize>, ModelError> {
    let ranking = response
        .get("ranking")
        .ok_or(ModelError::MissingField { field: "ranking" })?;

    let entries = ranking.as_array().ok_or_else(|| {
        ModelError::MalformedResponse(format!("'ranking' must be an array, got {}", ranking))
    })?;

    entries
        .iter()
        .map(|entry| {
            let id = match entry {
                Value::Number(n) => n.as_u64().map(|id| id as usize),
                // Some models quote numeric ids
                Value::String(s) => s.trim().parse::<usize>().ok(),
                _ => None,
            };
            id.ok_or_else(|| {
                ModelError::MalformedResponse(format!(
                    "ranking entry {} is not a candidate id",
                    entry
                ))
            })
        })
        .collect()
}

/// Extract the `"rows"` list of per-row results, in submission order
pub fn parse_rows(response: &Value) -> Result<Vec<Value>, ModelError> {
    let rows = response
        .get("rows")
        .ok_or(ModelError::MissingField { field: "rows" })?;

    rows.as_array().cloned().ok_or_else(|| {
        ModelError::MalformedResponse(format!("'rows' must be an array, got {}", rows))
    })
}
