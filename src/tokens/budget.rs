use super::TokenCounter;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BudgetError {
    #[error("token budget: fixed prompt overhead of {overhead} tokens does not fit a context window of {context_window} tokens")]
    OverheadExceedsWindow {
        overhead: usize,
        context_window: usize,
    },

    #[error("token budget: candidate {id} needs {tokens} tokens but only {available} are available; content too large for model")]
    CandidateTooLarge {
        id: usize,
        tokens: usize,
        available: usize,
    },

    #[error("token budget: a single row needs up to {tokens} tokens but only {available} are available")]
    RowTooLarge { tokens: usize, available: usize },

    #[error("token budget: failed to load tokenizer {encoding}: {message}")]
    TokenizerLoad { encoding: String, message: String },
}

/// Context-window accounting for one model invocation
///
/// Derived once per invocation and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelBudget {
    pub context_window: usize,
    pub max_output_tokens: usize,
    pub fixed_overhead_tokens: usize,
    pub available_tokens: usize,
}

impl ModelBudget {
    /// Whether content of `tokens` fits next to `used` already-spent tokens
    pub fn fits(&self, used: usize, tokens: usize) -> bool {
        used.saturating_add(tokens) <= self.available_tokens
    }

    /// Tokens left after spending `used`
    pub fn remaining(&self, used: usize) -> usize {
        self.available_tokens.saturating_sub(used)
    }
}

/// Sizes a model call: what is left for row content once the fixed prompt
/// (template plus user instructions) is paid for.
pub struct TokenBudgetPlanner<'a> {
    counter: &'a TokenCounter,
}

impl<'a> TokenBudgetPlanner<'a> {
    pub fn new(counter: &'a TokenCounter) -> Self {
        Self { counter }
    }

    /// Plan the budget for one invocation
    ///
    /// # Arguments
    /// * `template` - Static prompt template text
    /// * `instructions` - User instructions rendered into the template
    /// * `context_window` - Model context window in tokens
    /// * `max_output_tokens` - Model output limit, carried for the call settings
    ///
    /// # Errors
    /// `OverheadExceedsWindow` when the fixed overhead alone fills the window.
    pub fn plan(
        &self,
        template: &str,
        instructions: &str,
        context_window: usize,
        max_output_tokens: usize,
    ) -> Result<ModelBudget, BudgetError> {
        let fixed_overhead_tokens =
            self.counter.count_cached(template) + self.counter.count_cached(instructions);

        // A zero-token budget can never hold a row.
        if fixed_overhead_tokens >= context_window {
            return Err(BudgetError::OverheadExceedsWindow {
                overhead: fixed_overhead_tokens,
                context_window,
            });
        }

        let budget = ModelBudget {
            context_window,
            max_output_tokens,
            fixed_overhead_tokens,
            available_tokens: context_window - fixed_overhead_tokens,
        };

        tracing::debug!(
            "Planned budget: window={} overhead={} available={}",
            budget.context_window,
            budget.fixed_overhead_tokens,
            budget.available_tokens
        );

        Ok(budget)
    }
}
