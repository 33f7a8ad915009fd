//! LLM-backed reranking and batch inference
//!
//! The engines here never talk to a provider directly. They size each
//! prompt against the model's context window, call a [`LanguageModel`]
//! once per window or chunk, and map the structured responses back onto
//! the caller's rows.

mod batch;
mod dedup;
mod prompt;
mod rerank;
mod response;

pub use batch::{BatchConfig, BatchError, ChunkPlan, ChunkedBatchInferencer};
pub use dedup::{deduplicate_rows, worst_case_row, Deduplicated};
pub use prompt::{PromptError, PromptTemplate, BATCH_TEMPLATE, FILTER_TEMPLATE, RERANK_TEMPLATE};
pub use rerank::{Candidate, RerankConfig, RerankError, Retention, SlidingWindowReranker};
pub use response::{parse_ranking, parse_rows};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("model response: missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("model response: {0}")]
    MalformedResponse(String),

    #[error("model response: invalid ranking: {0}")]
    InvalidRanking(String),

    #[error("model response: expected {expected} rows, got {actual}")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("model response: expected {expected}, got {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: String,
    },

    #[error("model response: expected {expected} embeddings, got {actual}")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("model provider {provider}: {message}")]
    Provider {
        provider: ProviderKind,
        message: String,
    },
}

/// Backend family a model is served by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions
    #[default]
    OpenAi,
    /// Azure OpenAI deployments
    Azure,
    /// Local Ollama HTTP server
    Ollama,
    /// AWS Bedrock managed models
    Bedrock,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Azure => "azure",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Bedrock => "bedrock",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved model metadata for one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    /// Catalog name the caller used
    pub model_name: String,
    /// Provider-side model identifier
    pub model: String,
    pub provider: ProviderKind,
    pub context_window: usize,
    pub max_output_tokens: usize,
    pub temperature: f32,
}

impl ModelDetails {
    /// Settings sent with every completion; caller-supplied keys win
    pub fn call_settings(&self, overrides: &Value) -> Value {
        let mut settings = json!({
            "temperature": self.temperature,
            "max_tokens": self.max_output_tokens,
        });

        if let (Some(base), Some(extra)) = (settings.as_object_mut(), overrides.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }

        settings
    }
}

/// Model invocation capability
///
/// Implementations own transport, authentication and retries. A call
/// either returns parsed JSON or fails; the engines never retry.
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt, returning the parsed structured response
    fn complete(
        &self,
        prompt: &str,
        model: &ModelDetails,
        settings: &Value,
    ) -> Result<Value, ModelError>;

    /// Embed each input text
    fn embed(&self, inputs: &[String], model: &ModelDetails) -> Result<Vec<Vec<f64>>, ModelError> {
        let _ = inputs;
        Err(ModelError::Provider {
            provider: model.provider,
            message: format!("embeddings are not supported for {}", model.model),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> ModelDetails {
        ModelDetails {
            model_name: "default".to_string(),
            model: "gpt-4o-mini".to_string(),
            provider: ProviderKind::OpenAi,
            context_window: 128_000,
            max_output_tokens: 4096,
            temperature: 0.5,
        }
    }

    #[test]
    fn test_call_settings_defaults() {
        let settings = details().call_settings(&Value::Null);
        assert_eq!(settings["max_tokens"], 4096);
        assert_eq!(settings["temperature"], 0.5);
    }

    #[test]
    fn test_call_settings_override() {
        let settings = details().call_settings(&json!({"temperature": 0.0, "seed": 7}));
        assert_eq!(settings["temperature"], 0.0);
        assert_eq!(settings["seed"], 7);
        assert_eq!(settings["max_tokens"], 4096);
    }

    #[test]
    fn test_provider_names() {
        let kind: ProviderKind = serde_json::from_str("\"ollama\"").unwrap();
        assert_eq!(kind, ProviderKind::Ollama);
        assert_eq!(ProviderKind::Bedrock.to_string(), "bedrock");
    }

    #[test]
    fn test_embed_unsupported_by_default() {
        struct Echo;
        impl LanguageModel for Echo {
            fn complete(&self, prompt: &str, _: &ModelDetails, _: &Value) -> Result<Value, ModelError> {
                Ok(json!({ "echo": prompt }))
            }
        }

        let err = Echo.embed(&["text".to_string()], &details()).unwrap_err();
        assert!(matches!(err, ModelError::Provider { provider: ProviderKind::OpenAi, .. }));
    }
}
