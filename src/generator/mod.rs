//! Raw text generation backends.
//!
//! A [`TextGenerator`] turns a [`Prompt`] into model output text and knows
//! nothing about phases or schemas. Two real backends exist:
//! - [`ClaudeCli`] spawns the `claude` CLI in print mode
//! - [`GeminiClient`] calls the Gemini `generateContent` HTTP API
//!
//! [`ScriptedGenerator`] replays canned output for tests.

pub mod claude_cli;
pub mod gemini;
pub mod scripted;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{Backend, Config};
use crate::errors::GeneratorError;

pub use claude_cli::ClaudeCli;
pub use gemini::GeminiClient;
pub use scripted::ScriptedGenerator;

/// A rendered prompt: the role-setting system text plus the task itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Both parts joined, for backends without a separate system channel
    /// and for transcripts.
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short backend name used in logs and reports.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &Prompt) -> Result<String, GeneratorError>;
}

/// Build the generator selected by the runtime configuration.
pub fn from_config(config: &Config) -> Result<Arc<dyn TextGenerator>, GeneratorError> {
    match config.backend {
        Backend::Claude => Ok(Arc::new(ClaudeCli::new(
            config.claude_cmd.clone(),
            config.model.clone(),
            config.generator_timeout,
            config.project_dir.clone(),
        ))),
        Backend::Gemini => {
            let key = config.gemini_api_key.clone().ok_or_else(|| {
                GeneratorError::Misconfiguration(
                    "GEMINI_API_KEY is not set; export it or switch backend to claude".into(),
                )
            })?;
            let client = GeminiClient::new(
                key,
                config
                    .model
                    .clone()
                    .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
                config.temperature,
                config.max_output_tokens,
                config.generator_timeout,
            )?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_prompt_joins_parts() {
        let p = Prompt::new("You are a tester.", "Test this.");
        assert_eq!(p.combined(), "You are a tester.\n\nTest this.");
    }
}
