use super::{FunctionContext, PromptSource, INVALID_RANK};
use crate::error::Result;
use crate::fusion::{fuse, FusionMethod, FusionOutcome, ScoreMatrix};
use crate::llm::{Candidate, PromptTemplate, SlidingWindowReranker, RERANK_TEMPLATE};
use serde_json::Value;

impl FunctionContext<'_> {
    /// Fuse score columns, one `"<rank> (<score>)"` string per row
    pub fn fusion(&self, method: FusionMethod, columns: &[Vec<Value>]) -> Result<Vec<String>> {
        let matrix = ScoreMatrix::from_json_columns(columns)?;

        Ok(match fuse(&matrix, method, &self.config.fusion) {
            FusionOutcome::Ranked(rows) => rows.iter().map(ToString::to_string).collect(),
            FusionOutcome::Undefined => vec![INVALID_RANK.to_string()],
        })
    }

    /// Rerank rows by relevance, returning the retained rows best first
    pub fn llm_rerank(&self, model: &str, prompt: &PromptSource, rows: Vec<Value>) -> Result<Value> {
        let details = self.resolve_model(model)?;
        let instructions = self.resolve_prompt(prompt)?;
        let template = PromptTemplate::new(RERANK_TEMPLATE)?;

        let reranker = SlidingWindowReranker::new(
            self.model,
            &details,
            &self.counter,
            &template,
            &instructions,
            self.config.rerank.clone(),
        )?;

        let ranked = reranker.rerank(Candidate::from_rows(rows))?;
        Ok(Value::Array(ranked.into_iter().map(|c| c.content).collect()))
    }
}
