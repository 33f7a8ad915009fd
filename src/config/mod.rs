//! Configuration management for rankfuse
//!
//! One [`Config`] is loaded at startup and passed by reference to every
//! component. It also carries the model and prompt catalog the function
//! layer resolves names against.

use crate::error::{RankfuseError, Result};
use crate::fusion::FusionConfig;
use crate::llm::{BatchConfig, ModelDetails, ProviderKind, RerankConfig};
use crate::tokens::Encoding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Supported configuration schema
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub rerank: RerankConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub defaults: ModelDefaults,
    #[serde(default)]
    pub models: BTreeMap<String, ModelEntry>,
    #[serde(default)]
    pub prompts: BTreeMap<String, PromptEntry>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Tokenizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub encoding: Encoding,
    /// Cached token counts (0 disables the cache)
    pub cache_capacity: u64,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Cl100kBase,
            cache_capacity: 10_000,
        }
    }
}

/// Fallbacks for catalog entries that leave limits unset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDefaults {
    pub context_window: usize,
    pub max_output_tokens: usize,
    pub temperature: f32,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            context_window: 128_000,
            max_output_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// A named model in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Provider-side model identifier
    pub model: String,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A named prompt in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEntry {
    pub text: String,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rrf_k: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carry_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_parallel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window: Option<usize>,
}

/// Outcome of a catalog lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RankfuseError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| RankfuseError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RankfuseError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| RankfuseError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Load from `path` if it exists, else fall back to validated defaults
    pub fn load_or_default(path: &Path, profile: Option<&str>) -> Result<Self> {
        if path.exists() {
            return match profile {
                Some(profile) => Self::load_with_profile(path, profile),
                None => Self::load(path),
            };
        }

        tracing::warn!(
            "Config file not found, using defaults. Run 'rankfuse config init' to create one."
        );
        Self::default_with_overrides(env_overrides(), profile)
    }

    /// Built-in defaults with overrides and an optional profile applied, then validated
    pub fn default_with_overrides(
        vars: impl IntoIterator<Item = (String, String)>,
        profile: Option<&str>,
    ) -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(vars);
        if let Some(profile) = profile {
            config.apply_profile(profile)?;
        }
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| RankfuseError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(k) = overrides.rrf_k {
            self.fusion.rrf_k = k;
        }
        if let Some(ratio) = overrides.carry_ratio {
            self.rerank.carry_ratio = ratio;
        }
        if let Some(parallel) = overrides.batch_parallel {
            self.batch.parallel = parallel;
        }
        if let Some(window) = overrides.context_window {
            self.defaults.context_window = window;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: RANKFUSE_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(env_overrides());
    }

    /// Apply `SECTION__KEY` style overrides, logging the ones that fail
    pub fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            let path = key.strip_prefix("RANKFUSE_").unwrap_or(&key);
            if let Err(e) = self.set_value_from_env(path, &value) {
                tracing::warn!("Failed to apply env override {}: {}", key, e);
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        fn parse<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
            value.parse().map_err(|_| RankfuseError::InvalidConfigValue {
                path: path.to_string(),
                message: format!("Cannot parse '{}'", value),
            })
        }

        match path {
            "FUSION__RRF_K" => self.fusion.rrf_k = parse(path, value)?,
            "RERANK__CARRY_RATIO" => self.rerank.carry_ratio = parse(path, value)?,
            "BATCH__PARALLEL" => self.batch.parallel = parse(path, value)?,
            "DEFAULTS__CONTEXT_WINDOW" => self.defaults.context_window = parse(path, value)?,
            "DEFAULTS__MAX_OUTPUT_TOKENS" => self.defaults.max_output_tokens = parse(path, value)?,
            "TOKENIZER__CACHE_CAPACITY" => self.tokenizer.cache_capacity = parse(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Resolve a catalog model into invocation metadata
    pub fn model(&self, name: &str) -> Lookup<ModelDetails> {
        match self.models.get(name) {
            Some(entry) => Lookup::Found(ModelDetails {
                model_name: name.to_string(),
                model: entry.model.clone(),
                provider: entry.provider,
                context_window: entry.context_window.unwrap_or(self.defaults.context_window),
                max_output_tokens: entry
                    .max_output_tokens
                    .unwrap_or(self.defaults.max_output_tokens),
                temperature: entry.temperature.unwrap_or(self.defaults.temperature),
            }),
            None => Lookup::NotFound,
        }
    }

    /// Resolve a catalog prompt
    pub fn prompt(&self, name: &str) -> Lookup<&str> {
        match self.prompts.get(name) {
            Some(entry) => Lookup::Found(entry.text.as_str()),
            None => Lookup::NotFound,
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RankfuseError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("rankfuse").join("config.toml"))
    }
}

fn env_overrides() -> Vec<(String, String)> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with("RANKFUSE_"))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert(
            "default".to_string(),
            ModelEntry {
                model: "gpt-4o-mini".to_string(),
                provider: ProviderKind::OpenAi,
                context_window: None,
                max_output_tokens: None,
                temperature: None,
            },
        );

        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            tokenizer: TokenizerConfig::default(),
            fusion: FusionConfig::default(),
            rerank: RerankConfig::default(),
            batch: BatchConfig::default(),
            defaults: ModelDefaults::default(),
            models,
            prompts: BTreeMap::new(),
            profiles: BTreeMap::new(),
        }
    }
}
