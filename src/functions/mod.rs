//! Row-oriented entry points over the fusion and LLM engines
//!
//! A [`FunctionContext`] resolves model and prompt names against the
//! configured catalog and produces exactly one output per input row.

mod aggregate;
mod scalar;

use crate::config::{Config, Lookup};
use crate::error::{RankfuseError, Result};
use crate::llm::{LanguageModel, ModelDetails};
use crate::tokens::TokenCounter;

/// Marker written for a row-group that cannot be ranked
pub const INVALID_RANK: &str = "-1 (INVALID)";

/// Where a prompt's instruction text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// Literal instruction text
    Inline(String),
    /// A prompt stored in the catalog
    Named(String),
}

impl PromptSource {
    pub fn inline(text: impl Into<String>) -> Self {
        PromptSource::Inline(text.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        PromptSource::Named(name.into())
    }
}

/// Shared state for one session of function calls
pub struct FunctionContext<'a> {
    config: &'a Config,
    counter: TokenCounter,
    model: &'a dyn LanguageModel,
}

impl<'a> FunctionContext<'a> {
    /// Build a context, loading the configured tokenizer
    pub fn new(config: &'a Config, model: &'a dyn LanguageModel) -> Result<Self> {
        let counter = TokenCounter::new(config.tokenizer.encoding, config.tokenizer.cache_capacity)?;
        Ok(Self::with_counter(config, counter, model))
    }

    pub fn with_counter(
        config: &'a Config,
        counter: TokenCounter,
        model: &'a dyn LanguageModel,
    ) -> Self {
        Self {
            config,
            counter,
            model,
        }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn counter(&self) -> &TokenCounter {
        &self.counter
    }

    /// Resolve a catalog model name
    pub fn resolve_model(&self, name: &str) -> Result<ModelDetails> {
        match self.config.model(name) {
            Lookup::Found(details) => Ok(details),
            Lookup::NotFound => Err(RankfuseError::ModelNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Resolve a prompt to its instruction text
    pub fn resolve_prompt(&self, source: &PromptSource) -> Result<String> {
        match source {
            PromptSource::Inline(text) => Ok(text.clone()),
            PromptSource::Named(name) => match self.config.prompt(name) {
                Lookup::Found(text) => Ok(text.to_string()),
                Lookup::NotFound => Err(RankfuseError::PromptNotFound { name: name.clone() }),
            },
        }
    }
}
