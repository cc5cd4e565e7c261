//! Sources of clarification answers.
//!
//! The clarification gate asks an [`AnswerSource`] for one answer per
//! question, strictly in order. `None` means the channel closed and no more
//! answers will come.

use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use dialoguer::{Input, theme::ColorfulTheme};
use tokio::sync::mpsc;

#[async_trait]
pub trait AnswerSource: Send {
    /// Wait for the answer to question `index` (0-based) of `total`.
    async fn next_answer(&mut self, index: usize, total: usize, question: &str) -> Option<String>;
}

/// Prompts on the terminal with dialoguer.
///
/// End of input (Ctrl-D, closed stdin) or Ctrl-C closes the channel.
#[derive(Debug, Default)]
pub struct TerminalAnswers;

#[async_trait]
impl AnswerSource for TerminalAnswers {
    async fn next_answer(&mut self, index: usize, total: usize, question: &str) -> Option<String> {
        let prompt = format!("[{}/{}] {}", index + 1, total, question);
        let answer = tokio::task::spawn_blocking(move || {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
        })
        .await;

        match answer {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                tracing::info!(error = %e, "Answer input closed");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Answer prompt task failed");
                None
            }
        }
    }
}

/// A fixed list of answers; closes once the list is used up.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnswers {
    answers: VecDeque<String>,
}

impl ScriptedAnswers {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    /// One answer per line. Blank lines are kept as blank answers so line
    /// numbers match question numbers.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read answers file: {}", path.display()))?;
        Ok(Self::new(content.lines()))
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

#[async_trait]
impl AnswerSource for ScriptedAnswers {
    async fn next_answer(&mut self, _index: usize, _total: usize, _question: &str) -> Option<String> {
        self.answers.pop_front()
    }
}

/// Answers arriving over a tokio channel, e.g. from another task or a UI.
///
/// Dropping every sender closes the source.
pub struct ChannelAnswers {
    rx: mpsc::Receiver<String>,
}

impl ChannelAnswers {
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }

    /// A connected sender/source pair.
    pub fn channel(buffer: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl AnswerSource for ChannelAnswers {
    async fn next_answer(&mut self, _index: usize, _total: usize, _question: &str) -> Option<String> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_answers_run_dry() {
        let mut src = ScriptedAnswers::new(["yes", "no"]);
        assert_eq!(src.next_answer(0, 3, "a?").await.as_deref(), Some("yes"));
        assert_eq!(src.next_answer(1, 3, "b?").await.as_deref(), Some("no"));
        assert_eq!(src.next_answer(2, 3, "c?").await, None);
    }

    #[tokio::test]
    async fn answers_file_keeps_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.txt");
        std::fs::write(&path, "keyboard\n\n3 lives\n").unwrap();
        let mut src = ScriptedAnswers::from_file(&path).unwrap();
        assert_eq!(src.remaining(), 3);
        assert_eq!(src.next_answer(0, 3, "").await.as_deref(), Some("keyboard"));
        assert_eq!(src.next_answer(1, 3, "").await.as_deref(), Some(""));
        assert_eq!(src.next_answer(2, 3, "").await.as_deref(), Some("3 lives"));
    }

    #[test]
    fn missing_answers_file_is_error() {
        let err = ScriptedAnswers::from_file(Path::new("/nonexistent/answers.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read answers file"));
    }

    #[tokio::test]
    async fn channel_closes_when_senders_drop() {
        let (tx, mut src) = ChannelAnswers::channel(4);
        tx.send("first".into()).await.unwrap();
        drop(tx);
        assert_eq!(src.next_answer(0, 2, "q").await.as_deref(), Some("first"));
        assert_eq!(src.next_answer(1, 2, "q").await, None);
    }
}
