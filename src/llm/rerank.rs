//! Sliding-window LLM reranking
//!
//! Candidates are pulled from the tail of the input into a window until the
//! next one would overflow the token budget. The model reorders the window;
//! the less relevant part is settled and the rest is carried into the next
//! window, which is refilled from the remaining tail. Later-settled tiers
//! outrank earlier ones, and the final carried window ranks highest.

use super::{parse_ranking, LanguageModel, ModelDetails, ModelError, PromptError, PromptTemplate};
use crate::tokens::{BudgetError, ModelBudget, TokenBudgetPlanner, TokenCounter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RerankError {
    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("rerank: invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("rerank: failed to serialize candidates: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One reranking unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable original position
    pub id: usize,
    /// Opaque row payload
    pub content: Value,
}

impl Candidate {
    pub fn new(id: usize, content: Value) -> Self {
        Self { id, content }
    }

    /// Wrap rows as candidates numbered by input position
    pub fn from_rows(rows: impl IntoIterator<Item = Value>) -> Vec<Self> {
        rows.into_iter()
            .enumerate()
            .map(|(id, content)| Self::new(id, content))
            .collect()
    }
}

/// How much of the refined ordering is returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// The most relevant `ceil(N / 2)` candidates
    #[default]
    TopHalf,
    /// Every candidate, most relevant first
    All,
    /// At most `k` candidates
    TopK(usize),
}

impl Retention {
    pub fn keep(&self, total: usize) -> usize {
        match self {
            Retention::TopHalf => total - total / 2,
            Retention::All => total,
            Retention::TopK(k) => (*k).min(total),
        }
    }
}

/// Sliding-window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// Share of each reordered window carried into the next one
    pub carry_ratio: f64,

    /// What part of the final ordering is returned
    pub retention: Retention,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            carry_ratio: 0.5,
            retention: Retention::TopHalf,
        }
    }
}

impl RerankConfig {
    pub fn validate(&self) -> Result<(), RerankError> {
        // carry < window length is what guarantees progress
        if !(0.0..1.0).contains(&self.carry_ratio) {
            return Err(RerankError::InvalidConfig(format!(
                "carry_ratio must be in [0, 1), got {}",
                self.carry_ratio
            )));
        }
        Ok(())
    }

    fn carried(&self, window_len: usize) -> usize {
        (window_len as f64 * self.carry_ratio).floor() as usize
    }
}

/// Sliding-window reranker bound to one model and prompt
pub struct SlidingWindowReranker<'a> {
    model: &'a dyn LanguageModel,
    details: &'a ModelDetails,
    counter: &'a TokenCounter,
    template: &'a PromptTemplate,
    instructions: &'a str,
    budget: ModelBudget,
    config: RerankConfig,
    settings: Value,
}

impl<'a> SlidingWindowReranker<'a> {
    /// Create a reranker, sizing the budget up front
    ///
    /// # Errors
    /// Fails before any model call if the template lacks a `{{tuples}}`
    /// placeholder, the configuration is invalid, or the template and
    /// instructions alone fill the context window.
    pub fn new(
        model: &'a dyn LanguageModel,
        details: &'a ModelDetails,
        counter: &'a TokenCounter,
        template: &'a PromptTemplate,
        instructions: &'a str,
        config: RerankConfig,
    ) -> Result<Self, RerankError> {
        template.require("tuples")?;
        config.validate()?;

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

    /// Token cost of one candidate in its serialized prompt form
    pub fn candidate_tokens(&self, candidate: &Candidate) -> Result<usize, RerankError> {
        let text = serde_json::to_string(candidate)?;
        Ok(self.counter.count_cached(&text))
    }

    /// Rerank candidates given in prior-retrieval order
    ///
    /// Returns the retained candidates, most relevant first.
    pub fn rerank(&self, candidates: Vec<Candidate>) -> Result<Vec<Candidate>, RerankError> {
        let total = candidates.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        info!(
            "Reranking {} candidates with {} ({} tokens available)",
            total, self.details.model, self.budget.available_tokens
        );

        let mut pending: Vec<(Candidate, usize)> = Vec::with_capacity(total);
        for candidate in candidates {
            let tokens = self.candidate_tokens(&candidate)?;
            if tokens > self.budget.available_tokens {
                return Err(BudgetError::CandidateTooLarge {
                    id: candidate.id,
                    tokens,
                    available: self.budget.available_tokens,
                }
                .into());
            }
            pending.push((candidate, tokens));
        }

        let mut window: Vec<Candidate> = Vec::new();
        let mut window_tokens = 0;
        let mut tiers: Vec<Vec<Candidate>> = Vec::new();
        let mut calls = 0;

        loop {
            // Pull from the tail while the next candidate still fits
            let mut added = 0;
            while let Some((candidate, tokens)) = pending.pop() {
                if !self.budget.fits(window_tokens, tokens) {
                    pending.push((candidate, tokens));
                    break;
                }
                window_tokens += tokens;
                window.push(candidate);
                added += 1;
            }

            if window.is_empty() {
                match pending.last() {
                    Some((candidate, tokens)) => {
                        return Err(BudgetError::CandidateTooLarge {
                            id: candidate.id,
                            tokens: *tokens,
                            available: self.budget.available_tokens,
                        }
                        .into())
                    }
                    None => break,
                }
            }

            debug!(
                "Window {}: {} candidates, {} tokens",
                tiers.len() + 1,
                window.len(),
                window_tokens
            );

            if window.len() > 1 && added > 0 {
                window = self.rank_window(window)?;
                calls += 1;
            } else if window.len() > 1 {
                // Only the carried part is left and it is already in model order
                debug!("No new candidates joined the window, settling without a call");
            }

            let carried = self.config.carried(window.len());
            let settled = window.split_off(carried);
            tiers.push(settled);

            window_tokens = window
                .iter()
                .map(|c| self.candidate_tokens(c))
                .sum::<Result<usize, _>>()?;

            if pending.is_empty() {
                break;
            }
        }

        tiers.push(window);

        let keep = self.config.retention.keep(total);
        let ranked: Vec<Candidate> = tiers.into_iter().rev().flatten().take(keep).collect();

        info!(
            "Reranked {} candidates in {} model calls, returning {}",
            total,
            calls,
            ranked.len()
        );

        Ok(ranked)
    }

    /// Ask the model to reorder one window, most relevant first
    fn rank_window(&self, window: Vec<Candidate>) -> Result<Vec<Candidate>, RerankError> {
        let tuples = serde_json::to_string(&window)?;
        let prompt = self
            .template
            .render(&[("user_prompt", self.instructions), ("tuples", &tuples)]);

        let response = self.model.complete(&prompt, self.details, &self.settings)?;
        let ranking = parse_ranking(&response)?;

        Ok(apply_ranking(window, &ranking)?)
    }
}

/// Reorder a window by candidate id; the ranking must be a permutation
fn apply_ranking(window: Vec<Candidate>, ranking: &[usize]) -> Result<Vec<Candidate>, ModelError> {
    if ranking.len() != window.len() {
        return Err(ModelError::InvalidRanking(format!(
            "expected {} ids, got {}",
            window.len(),
            ranking.len()
        )));
    }

    let mut slots: Vec<Option<Candidate>> = window.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(slots.len());

    for &id in ranking {
        let slot = slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|c| c.id == id))
            .and_then(Option::take)
            .ok_or_else(|| {
                ModelError::InvalidRanking(format!("id {} is unknown or repeated", id))
            })?;
        ordered.push(slot);
    }

    Ok(ordered)
}
