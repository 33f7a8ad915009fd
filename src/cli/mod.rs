//! CLI command definitions and parsing
use crate::fusion::FusionMethod;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rankfuse",
    version,
    author = "neur0map",
    about = "Rank fusion and token-budgeted LLM reranking for query pipelines",
    long_about = "Rankfuse combines per-row score columns into one ranking (CombSUM, CombMNZ, \
                  CombANZ, CombMED, RRF) and sizes LLM reranking windows and batch chunks \
                  against a model's context window."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/rankfuse/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply on top of the config file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fuse score columns into one ranking
    Fuse {
        /// Fusion algorithm
        #[arg(short, long, value_enum, default_value = "rrf")]
        method: FusionMethod,

        /// JSON file with {"columns": [[...], ...]} (reads stdin when omitted)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count tokens with the configured encoding
    Tokens {
        /// Text to count (reads stdin when neither TEXT nor --file is given)
        text: Option<String>,

        /// Count the contents of a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Show the token budget a model and prompt leave for row content
    Plan {
        /// Catalog model name
        #[arg(short, long, default_value = "default")]
        model: String,

        /// Catalog prompt name
        #[arg(long, conflicts_with = "prompt_text")]
        prompt: Option<String>,

        /// Literal prompt text
        #[arg(long)]
        prompt_text: Option<String>,

        /// Which engine's template to size
        #[arg(short, long, value_enum, default_value = "rerank")]
        template: TemplateKind,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Sliding-window reranking
    Rerank,
    /// Chunked batch completion
    Batch,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the default configuration path
    Path,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
