//! Row deduplication and worst-case row sizing for batch inference

use ahash::{HashMap, HashMapExt};
use crate::tokens::TokenCounter;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Unique rows plus, for every input row, its position among them
#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated {
    /// First occurrence of each distinct row, in input order
    pub unique: Vec<Value>,
    /// `indexes[i]` is the position of input row `i` in `unique`
    pub indexes: Vec<usize>,
}

/// Deduplicate rows by exact structural equality
///
/// Rows are keyed by their compact JSON form; object keys serialize in
/// sorted order, so two structurally equal rows always share a key.
pub fn deduplicate_rows(rows: &[Value]) -> Deduplicated {
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(rows.len());
    let mut unique = Vec::new();
    let mut indexes = Vec::with_capacity(rows.len());

    for row in rows {
        let next = unique.len();
        let index = *seen.entry(row.to_string()).or_insert(next);
        if index == next {
            unique.push(row.clone());
        }
        indexes.push(index);
    }

    Deduplicated { unique, indexes }
}

/// Conservative stand-in for the most expensive row, in serialized form
///
/// For every field, keeps the value whose compact JSON costs the most tokens
/// across all rows, and returns those values as one JSON object. Object keys
/// serialize in sorted order, the same way rows are rendered into a chunk.
/// Non-object rows contribute their own costliest serialized value.
pub fn worst_case_row(rows: &[Value], counter: &TokenCounter) -> String {
    let mut fields: BTreeMap<&str, Costed> = BTreeMap::new();
    let mut scalar: Option<Costed> = None;

    for row in rows {
        match row {
            Value::Object(object) => {
                for (field, value) in object {
                    let costed = Costed::new(value, counter);
                    match fields.get(field.as_str()) {
                        Some(current) if current.tokens >= costed.tokens => {}
                        _ => {
                            fields.insert(field.as_str(), costed);
                        }
                    }
                }
            }
            other => {
                let costed = Costed::new(other, counter);
                if scalar.as_ref().map_or(true, |current| costed.tokens > current.tokens) {
                    scalar = Some(costed);
                }
            }
        }
    }

    let object = (!fields.is_empty()).then(|| {
        let map: Map<String, Value> = fields
            .into_iter()
            .map(|(field, costed)| (field.to_string(), costed.value))
            .collect();
        Value::Object(map).to_string()
    });
    let scalar = scalar.map(|costed| costed.value.to_string());

    match (object, scalar) {
        (Some(object), Some(scalar)) => {
            if counter.count(&scalar) > counter.count(&object) {
                scalar
            } else {
                object
            }
        }
        (Some(text), None) | (None, Some(text)) => text,
        (None, None) => String::new(),
    }
}

struct Costed {
    value: Value,
    tokens: usize,
}

impl Costed {
    fn new(value: &Value, counter: &TokenCounter) -> Self {
        Self {
            tokens: counter.count(&value.to_string()),
            value: value.clone(),
        }
    }
}
