use rankfuse::cli::{Cli, Commands, ConfigAction, TemplateKind};
use rankfuse::config::{Config, Lookup};
use rankfuse::error::{RankfuseError, Result};
use rankfuse::functions::INVALID_RANK;
use rankfuse::fusion::{fuse, FusionMethod, FusionOutcome, ScoreMatrix};
use rankfuse::llm::{BATCH_TEMPLATE, RERANK_TEMPLATE};
use rankfuse::tokens::{TokenBudgetPlanner, TokenCounter};
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Input document for `rankfuse fuse`
#[derive(Debug, Deserialize)]
struct FuseInput {
    columns: Vec<Vec<Value>>,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Fuse {
            method,
            input,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_fuse(&config, method, input.as_deref(), json)?;
        }
        Commands::Tokens { text, file } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_tokens(&config, text, file.as_deref())?;
        }
        Commands::Plan {
            model,
            prompt,
            prompt_text,
            template,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_plan(&config, &model, prompt, prompt_text, template)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "rankfuse=debug" } else { "rankfuse=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_fuse(config: &Config, method: FusionMethod, input: Option<&Path>, json: bool) -> Result<()> {
    let content = read_input(input)?;
    let input: FuseInput = serde_json::from_str(&content).map_err(|e| RankfuseError::Json {
        source: e,
        context: "Failed to parse fusion input".to_string(),
    })?;

    let matrix = ScoreMatrix::from_json_columns(&input.columns)?;
    let outcome = fuse(&matrix, method, &config.fusion);

    if json {
        let value = match &outcome {
            FusionOutcome::Ranked(rows) => serde_json::to_value(rows),
            FusionOutcome::Undefined => Ok(Value::Null),
        }
        .map_err(|e| RankfuseError::Json {
            source: e,
            context: "Failed to serialize fusion result".to_string(),
        })?;
        println!("{}", value);
        return Ok(());
    }

    match outcome {
        FusionOutcome::Ranked(rows) => {
            for row in rows {
                println!("{}", row);
            }
        }
        FusionOutcome::Undefined => println!("{}", INVALID_RANK),
    }
    Ok(())
}

fn cmd_tokens(config: &Config, text: Option<String>, file: Option<&Path>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => read_input(file)?,
    };

    let counter = TokenCounter::new(config.tokenizer.encoding, 0)?;
    println!("{}", counter.count(&text));
    Ok(())
}

fn cmd_plan(
    config: &Config,
    model: &str,
    prompt: Option<String>,
    prompt_text: Option<String>,
    template: TemplateKind,
) -> Result<()> {
    let details = match config.model(model) {
        Lookup::Found(details) => details,
        Lookup::NotFound => {
            return Err(RankfuseError::ModelNotFound {
                name: model.to_string(),
            })
        }
    };

    let instructions = match (prompt, prompt_text) {
        (Some(name), _) => match config.prompt(&name) {
            Lookup::Found(text) => text.to_string(),
            Lookup::NotFound => return Err(RankfuseError::PromptNotFound { name }),
        },
        (None, Some(text)) => text,
        (None, None) => String::new(),
    };

    let template_text = match template {
        TemplateKind::Rerank => RERANK_TEMPLATE,
        TemplateKind::Batch => BATCH_TEMPLATE,
    };

    let counter = TokenCounter::new(config.tokenizer.encoding, config.tokenizer.cache_capacity)?;
    let budget = TokenBudgetPlanner::new(&counter).plan(
        template_text,
        &instructions,
        details.context_window,
        details.max_output_tokens,
    )?;

    println!("Model: {} ({}, {})", details.model_name, details.model, details.provider);
    println!("  Encoding:          {}", counter.encoding());
    println!("  Context window:    {}", budget.context_window);
    println!("  Max output tokens: {}", budget.max_output_tokens);
    println!("  Fixed overhead:    {}", budget.fixed_overhead_tokens);
    println!("  Available:         {}", budget.available_tokens);
    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let path = resolve_path(config_path)?;

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
        ConfigAction::Show => {
            let config = load_config(config_path, None)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Validate { file } => {
            let path = match file {
                Some(file) => file,
                None => resolve_path(config_path)?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Models: {}", config.models.len());
            println!("  Prompts: {}", config.prompts.len());
        }
        ConfigAction::Path => {
            println!("{}", resolve_path(config_path)?.display());
        }
    }

    Ok(())
}

fn resolve_path(config_path: Option<PathBuf>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path),
        None => Config::default_path(),
    }
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = resolve_path(config_path)?;
    Config::load_or_default(&path, profile.as_deref())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| RankfuseError::Io {
            source: e,
            context: format!("Failed to read input file: {:?}", path),
        }),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| RankfuseError::Io {
                    source: e,
                    context: "Failed to read stdin".to_string(),
                })?;
            Ok(buffer)
        }
    }
}
