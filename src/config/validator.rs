use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{RankfuseError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_tokenizer(config, &mut errors);
        Self::validate_fusion(config, &mut errors);
        Self::validate_rerank(config, &mut errors);
        Self::validate_defaults(config, &mut errors);
        Self::validate_models(config, &mut errors);
        Self::validate_prompts(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RankfuseError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_tokenizer(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.tokenizer.cache_capacity > 10_000_000 {
            errors.push(ValidationError::new(
                "tokenizer.cache_capacity",
                format!(
                    "Cache capacity must be at most 10000000, got {}",
                    config.tokenizer.cache_capacity
                ),
            ));
        }
    }

    fn validate_fusion(config: &Config, errors: &mut Vec<ValidationError>) {
        let k = config.fusion.rrf_k;
        if !k.is_finite() || k < 0.0 {
            errors.push(ValidationError::new(
                "fusion.rrf_k",
                format!("RRF k must be a non-negative number, got {}", k),
            ));
        }
    }

    fn validate_rerank(config: &Config, errors: &mut Vec<ValidationError>) {
        if let Err(e) = config.rerank.validate() {
            errors.push(ValidationError::new("rerank.carry_ratio", e.to_string()));
        }
    }

    fn validate_defaults(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.defaults.context_window == 0 {
            errors.push(ValidationError::new(
                "defaults.context_window",
                "Context window must be greater than 0",
            ));
        }

        let temp = config.defaults.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "defaults.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }
    }

    fn validate_models(config: &Config, errors: &mut Vec<ValidationError>) {
        for (name, entry) in &config.models {
            if entry.model.is_empty() {
                errors.push(ValidationError::new(
                    format!("models.{}.model", name),
                    "Model identifier cannot be empty",
                ));
            }

            if entry.context_window == Some(0) {
                errors.push(ValidationError::new(
                    format!("models.{}.context_window", name),
                    "Context window must be greater than 0",
                ));
            }

            if let Some(temp) = entry.temperature {
                if !(0.0..=2.0).contains(&temp) {
                    errors.push(ValidationError::new(
                        format!("models.{}.temperature", name),
                        format!("Temperature must be between 0.0 and 2.0, got {}", temp),
                    ));
                }
            }
        }
    }

    fn validate_prompts(config: &Config, errors: &mut Vec<ValidationError>) {
        for (name, entry) in &config.prompts {
            if entry.text.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("prompts.{}.text", name),
                    "Prompt text cannot be empty",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelEntry, PromptEntry};
    use crate::llm::ProviderKind;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_carry_ratio() {
        let mut config = Config::default();
        config.rerank.carry_ratio = 1.5;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.meta.schema_version = "0.1.0".to_string();
        config.fusion.rrf_k = -1.0;
        config.models.insert(
            "broken".to_string(),
            ModelEntry {
                model: String::new(),
                provider: ProviderKind::Ollama,
                context_window: Some(0),
                max_output_tokens: None,
                temperature: Some(3.0),
            },
        );
        config.prompts.insert(
            "blank".to_string(),
            PromptEntry {
                text: "  ".to_string(),
            },
        );

        match ConfigValidator::validate(&config) {
            Err(RankfuseError::ConfigValidation { errors }) => assert_eq!(errors.len(), 6),
            other => panic!("expected validation errors, got {:?}", other),
        }
    }
}
