use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Prompt, TextGenerator};
use crate::errors::GeneratorError;

/// Replays a fixed sequence of outputs and records every prompt it receives.
///
/// Once the script is exhausted every further call fails with
/// [`GeneratorError::EmptyResponse`].
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GeneratorError>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(outputs.into_iter().map(|s| Ok(s.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue an error as the next result.
    pub fn push_error(&self, err: GeneratorError) {
        self.lock_script().push_back(Err(err));
    }

    pub fn push_output(&self, output: impl Into<String>) {
        self.lock_script().push_back(Ok(output.into()));
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, GeneratorError>>> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, GeneratorError> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.clone());
        self.lock_script()
            .pop_front()
            .unwrap_or(Err(GeneratorError::EmptyResponse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_runs_dry() {
        let g = ScriptedGenerator::new(["one", "two"]);
        let p = Prompt::new("s", "u");
        assert_eq!(g.generate(&p).await.unwrap(), "one");
        assert_eq!(g.generate(&p).await.unwrap(), "two");
        assert!(matches!(
            g.generate(&p).await,
            Err(GeneratorError::EmptyResponse)
        ));
        assert_eq!(g.prompts().len(), 3);
    }

    #[tokio::test]
    async fn queued_errors_are_returned() {
        let g = ScriptedGenerator::default();
        g.push_error(GeneratorError::Transport("reset".into()));
        g.push_output("ok");
        let p = Prompt::new("s", "u");
        assert!(g.generate(&p).await.is_err());
        assert_eq!(g.generate(&p).await.unwrap(), "ok");
    }
}
