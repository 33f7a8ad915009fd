//! Prompt templates with `{{ name }}` placeholders

use regex::{Captures, Regex};
use thiserror::Error;

/// Sliding-window reranking prompt
pub const RERANK_TEMPLATE: &str = r#"You are a semantic ranking engine. Rank the tuples below by how well they satisfy the user's instructions, most relevant first.

Instructions: {{user_prompt}}

Tuples (JSON array, each entry has an "id" and its "content"):
{{tuples}}

Respond with a JSON object of the form {"ranking": [<id>, ...]} that lists every id exactly once."#;

/// Per-row completion prompt used by the batch engine
pub const BATCH_TEMPLATE: &str = r#"Apply the user's instructions to each row below independently.

Instructions: {{user_prompt}}

Rows (JSON array):
{{rows}}

Respond with a JSON object of the form {"rows": [<result>, ...]} holding exactly one result per row, in the same order as the rows."#;

/// Per-row boolean filter prompt used by the batch engine
pub const FILTER_TEMPLATE: &str = r#"Decide for each row below whether it satisfies the user's instructions.

Instructions: {{user_prompt}}

Rows (JSON array):
{{rows}}

Respond with a JSON object of the form {"rows": [true, false, ...]} holding exactly one boolean per row, in the same order as the rows."#;

const PLACEHOLDER: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PromptError {
    #[error("prompt template: failed to compile placeholder pattern: {0}")]
    Pattern(String),

    #[error("prompt template: missing required placeholder {{{{{name}}}}}")]
    MissingPlaceholder { name: String },
}

/// A parsed prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    placeholder: Regex,
    names: Vec<String>,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Result<Self, PromptError> {
        let text = text.into();
        let placeholder = Regex::new(PLACEHOLDER).map_err(|e| PromptError::Pattern(e.to_string()))?;

        let mut names: Vec<String> = Vec::new();
        for caps in placeholder.captures_iter(&text) {
            let name = caps[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }

        Ok(Self {
            text,
            placeholder,
            names,
        })
    }

    /// Raw template text, as counted for the token budget
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Placeholder names in order of first appearance
    pub fn placeholders(&self) -> &[String] {
        &self.names
    }

    /// Fail unless the template has a `{{ name }}` placeholder
    pub fn require(&self, name: &str) -> Result<(), PromptError> {
        if self.names.iter().any(|n| n == name) {
            Ok(())
        } else {
            Err(PromptError::MissingPlaceholder {
                name: name.to_string(),
            })
        }
    }

    /// Substitute placeholders in a single pass
    ///
    /// Values are inserted verbatim and never re-expanded. Unknown
    /// placeholders render as empty text.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        self.placeholder
            .replace_all(&self.text, |caps: &Captures| {
                let name = &caps[1];
                match vars.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => (*value).to_string(),
                    None => {
                        tracing::debug!("No value for prompt placeholder {}", name);
                        String::new()
                    }
                }
            })
            .into_owned()
    }
}
