//! Deduplicating chunk batcher for per-row classification and extraction

use super::{
    deduplicate_rows, parse_rows, worst_case_row, LanguageModel, ModelDetails, ModelError,
    PromptError, PromptTemplate,
};
use crate::tokens::{BudgetError, ModelBudget, TokenBudgetPlanner, TokenCounter};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("batch: failed to serialize rows: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Batch engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Submit chunks concurrently; results still land in chunk order
    pub parallel: bool,
}

/// How unique rows are split into model calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Conservative token cost of one serialized row and its separator
    pub row_tokens: usize,
    /// Rows per model call
    pub chunk_size: usize,
    /// Number of model calls
    pub chunks: usize,
}

/// Chunked batch inferencer bound to one model and prompt
pub struct ChunkedBatchInferencer<'a> {
    model: &'a dyn LanguageModel,
    details: &'a ModelDetails,
    counter: &'a TokenCounter,
    template: &'a PromptTemplate,
    instructions: &'a str,
    budget: ModelBudget,
    config: BatchConfig,
    settings: Value,
}

impl<'a> ChunkedBatchInferencer<'a> {
    /// Create an inferencer, sizing the budget up front
    pub fn new(
        model: &'a dyn LanguageModel,
        details: &'a ModelDetails,
        counter: &'a TokenCounter,
        template: &'a PromptTemplate,
        instructions: &'a str,
        config: BatchConfig,
    ) -> Result<Self, BatchError> {
        template.require("rows")?;

        let budget = TokenBudgetPlanner::new(counter).plan(
            template.text(),
            instructions,
            details.context_window,
            details.max_output_tokens,
        )?;

        Ok(Self {
            model,
            details,
            counter,
            template,
            instructions,
            budget,
            config,
            settings: details.call_settings(&Value::Null),
        })
    }

    /// Replace the call settings with the model defaults merged with `overrides`
    pub fn with_settings(mut self, overrides: &Value) -> Self {
        self.settings = self.details.call_settings(overrides);
        self
    }

    pub fn budget(&self) -> &ModelBudget {
        &self.budget
    }

    /// Size chunks for a set of unique rows
    ///
    /// A chunk renders as a JSON array, so each row is costed as the
    /// serialized worst-case row plus one separator, and the array brackets
    /// are reserved once per chunk.
    ///
    /// # Errors
    /// `RowTooLarge` when even one worst-case row does not fit the budget.
    pub fn plan_chunks(&self, unique: &[Value]) -> Result<ChunkPlan, BatchError> {
        let worst = worst_case_row(unique, self.counter);
        let row_tokens = self.counter.count(&worst) + self.counter.count(",");
        let room = self
            .budget
            .available_tokens
            .saturating_sub(self.counter.count("[]"));

        if row_tokens > room {
            return Err(BudgetError::RowTooLarge {
                tokens: row_tokens,
                available: self.budget.available_tokens,
            }
            .into());
        }

        let chunk_size = (room / row_tokens).min(unique.len()).max(1);

        debug!(
            "Worst-case row costs {} tokens, {} of {} available after framing",
            row_tokens, room, self.budget.available_tokens
        );

        Ok(ChunkPlan {
            row_tokens,
            chunk_size,
            chunks: unique.len().div_ceil(chunk_size),
        })
    }

    /// Run the model over every row, one result per input row in input order
    ///
    /// Duplicate rows are sent once and share the same result.
    pub fn infer(&self, rows: &[Value]) -> Result<Vec<Value>, BatchError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let dedup = deduplicate_rows(rows);
        let plan = self.plan_chunks(&dedup.unique)?;

        info!(
            "Batch inference with {}: {} rows ({} unique) in {} chunks of up to {}",
            self.details.model,
            rows.len(),
            dedup.unique.len(),
            plan.chunks,
            plan.chunk_size
        );

        let call = ChunkCall {
            model: self.model,
            details: self.details,
            template: self.template,
            instructions: self.instructions,
            settings: &self.settings,
        };

        let per_chunk: Vec<Vec<Value>> = if self.config.parallel {
            dedup
                .unique
                .par_chunks(plan.chunk_size)
                .map(|chunk| call.run(chunk))
                .collect::<Result<_, _>>()?
        } else {
            dedup
                .unique
                .chunks(plan.chunk_size)
                .map(|chunk| call.run(chunk))
                .collect::<Result<_, _>>()?
        };

        let results: Vec<Value> = per_chunk.into_iter().flatten().collect();

        Ok(dedup
            .indexes
            .iter()
            .map(|&index| results[index].clone())
            .collect())
    }
}

/// Everything one chunk submission needs; shared across worker threads
struct ChunkCall<'a> {
    model: &'a dyn LanguageModel,
    details: &'a ModelDetails,
    template: &'a PromptTemplate,
    instructions: &'a str,
    settings: &'a Value,
}

impl ChunkCall<'_> {
    fn run(&self, chunk: &[Value]) -> Result<Vec<Value>, BatchError> {
        let rows = serde_json::to_string(chunk)?;
        let prompt = self
            .template
            .render(&[("user_prompt", self.instructions), ("rows", &rows)]);

        debug!("Submitting chunk of {} rows", chunk.len());

        let response = self.model.complete(&prompt, self.details, self.settings)?;
        let results = parse_rows(&response)?;

        if results.len() != chunk.len() {
            return Err(ModelError::RowCountMismatch {
                expected: chunk.len(),
                actual: results.len(),
            }
            .into());
        }

        Ok(results)
    }
}
