//! Token counter backed by tiktoken BPE tables
use super::BudgetError;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// BPE encoding used for counting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "cl100k_base")]
    Cl100kBase,
    #[serde(rename = "o200k_base")]
    O200kBase,
    #[serde(rename = "p50k_base")]
    P50kBase,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::O200kBase => "o200k_base",
            Encoding::P50kBase => "p50k_base",
        }
    }

    fn load(&self) -> anyhow::Result<CoreBPE> {
        match self {
            Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            Encoding::O200kBase => tiktoken_rs::o200k_base(),
            Encoding::P50kBase => tiktoken_rs::p50k_base(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Deterministic token counter
///
/// Counting is a pure function of the text. The optional cache is keyed by
/// the blake3 hash of the content and only saves repeated BPE passes.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
    encoding: Encoding,
    cache: Option<Cache<String, usize>>,
}

impl TokenCounter {
    /// Create a counter for the given encoding
    ///
    /// # Arguments
    /// * `encoding` - BPE table to load
    /// * `cache_capacity` - Number of cached counts to keep (0 disables caching)
    pub fn new(encoding: Encoding, cache_capacity: u64) -> Result<Self, BudgetError> {
        let bpe = encoding.load().map_err(|e| BudgetError::TokenizerLoad {
            encoding: encoding.name().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            "Loaded tokenizer {} (cache capacity {})",
            encoding,
            cache_capacity
        );

        let cache = (cache_capacity > 0).then(|| Cache::new(cache_capacity));

        Ok(Self {
            bpe: Arc::new(bpe),
            encoding,
            cache,
        })
    }

    /// Create a counter with cl100k_base and a 10k entry cache
    pub fn with_default_encoding() -> Result<Self, BudgetError> {
        Self::new(Encoding::Cl100kBase, 10_000)
    }

    /// Count tokens in the given text (uncached)
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Count tokens, reusing a previous count for identical content
    pub fn count_cached(&self, text: &str) -> usize {
        match &self.cache {
            Some(cache) => {
                let hash = blake3::hash(text.as_bytes()).to_hex().to_string();
                cache.get_with(hash, || self.count(text))
            }
            None => self.count(text),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &self.encoding)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
