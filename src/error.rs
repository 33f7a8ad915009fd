use crate::fusion::FusionError;
use crate::llm::{BatchError, ModelError, PromptError, RerankError};
use crate::tokens::BudgetError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rankfuse
#[derive(Error, Debug)]
pub enum RankfuseError {
    /// Configuration related errors
    #[error("configuration: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("configuration: validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("configuration: file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("configuration: invalid value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// A model name did not resolve against the catalog
    #[error("configuration: model not found: {name}")]
    ModelNotFound { name: String },

    /// A prompt name did not resolve against the catalog
    #[error("configuration: prompt not found: {name}")]
    PromptNotFound { name: String },

    /// Token budgeting errors
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Fusion input validation errors
    #[error(transparent)]
    Fusion(#[from] FusionError),

    /// Model response errors
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Prompt template errors
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// Sliding-window reranking errors
    #[error(transparent)]
    Rerank(#[from] RerankError),

    /// Chunked batch inference errors
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for rankfuse operations
pub type Result<T> = std::result::Result<T, RankfuseError>;
