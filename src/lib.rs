//! Rankfuse - rank fusion and token-budgeted LLM reranking
//!
//! Combines multiple per-row relevance signals into a single ranking, and
//! drives language models over row sets without ever overflowing their
//! context window: a sliding-window reranker for relevance ordering and a
//! deduplicating chunk batcher for per-row inference.

pub mod cli;
pub mod config;
pub mod error;
pub mod functions;
pub mod fusion;
pub mod llm;
pub mod tokens;

pub use error::{RankfuseError, Result};
