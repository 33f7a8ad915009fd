use super::{FunctionContext, PromptSource};
use crate::error::Result;
use crate::llm::{
    ChunkedBatchInferencer, ModelError, PromptTemplate, BATCH_TEMPLATE, FILTER_TEMPLATE,
};
use serde_json::Value;

impl FunctionContext<'_> {
    /// Apply a prompt to every row, one model result per row
    pub fn llm_complete(
        &self,
        model: &str,
        prompt: &PromptSource,
        rows: &[Value],
        settings: &Value,
    ) -> Result<Vec<Value>> {
        self.run_batch(BATCH_TEMPLATE, model, prompt, rows, settings)
    }

    /// Keep-or-drop decision for every row
    pub fn llm_filter(
        &self,
        model: &str,
        prompt: &PromptSource,
        rows: &[Value],
        settings: &Value,
    ) -> Result<Vec<bool>> {
        let results = self.run_batch(FILTER_TEMPLATE, model, prompt, rows, settings)?;
        Ok(results
            .iter()
            .map(as_verdict)
            .collect::<std::result::Result<_, _>>()?)
    }

    /// One embedding per row, from its field values joined with spaces
    pub fn llm_embedding(&self, model: &str, rows: &[Value]) -> Result<Vec<Vec<f64>>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let details = self.resolve_model(model)?;
        let inputs: Vec<String> = rows.iter().map(row_text).collect();

        tracing::info!("Embedding {} rows with {}", inputs.len(), details.model);
        let embeddings = self.model.embed(&inputs, &details)?;

        if embeddings.len() != inputs.len() {
            return Err(ModelError::EmbeddingCountMismatch {
                expected: inputs.len(),
                actual: embeddings.len(),
            }
            .into());
        }
        Ok(embeddings)
    }

    fn run_batch(
        &self,
        template: &str,
        model: &str,
        prompt: &PromptSource,
        rows: &[Value],
        settings: &Value,
    ) -> Result<Vec<Value>> {
        let details = self.resolve_model(model)?;
        let instructions = self.resolve_prompt(prompt)?;
        let template = PromptTemplate::new(template)?;

        let inferencer = ChunkedBatchInferencer::new(
            self.model,
            &details,
            &self.counter,
            &template,
            &instructions,
            self.config.batch.clone(),
        )?
        .with_settings(settings);

        Ok(inferencer.infer(rows)?)
    }
}

fn as_verdict(value: &Value) -> std::result::Result<bool, ModelError> {
    match value {
        Value::Bool(keep) => Ok(*keep),
        Value::Object(fields) => match fields.get("result") {
            Some(Value::Bool(keep)) => Ok(*keep),
            _ => Err(ModelError::UnexpectedValue {
                expected: "a boolean result",
                found: value.to_string(),
            }),
        },
        other => Err(ModelError::UnexpectedValue {
            expected: "a boolean result",
            found: other.to_string(),
        }),
    }
}

fn row_text(row: &Value) -> String {
    match row {
        Value::Object(fields) => fields
            .values()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(" "),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_verdict() {
        assert!(as_verdict(&json!(true)).unwrap());
        assert!(!as_verdict(&json!({"result": false})).unwrap());
        assert!(as_verdict(&json!("yes")).is_err());
        assert!(as_verdict(&json!({"result": 1})).is_err());
    }

    #[test]
    fn test_row_text() {
        assert_eq!(row_text(&json!({"a": "red shoes", "b": 42})), "red shoes 42");
        assert_eq!(row_text(&json!("plain")), "plain");
    }
}
