use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{AgentPort, AgentRequest, AgentResponse, PhaseKind, parse, prompts, schema};
use crate::errors::{AgentError, SchemaViolation};
use crate::generator::{Prompt, TextGenerator};
use crate::util::truncate_for_log;

const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Writes every prompt and raw output to a log directory.
///
/// Files are numbered in call order: `003-implement-attempt-1-prompt.md`
/// and `003-implement-attempt-1-output.log`.
pub struct TranscriptLog {
    dir: PathBuf,
    seq: AtomicU32,
}

impl TranscriptLog {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create transcript dir {}", dir.display()))?;
        Ok(Self {
            dir,
            seq: AtomicU32::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record(&self, phase: PhaseKind, attempt: u32, prompt: &Prompt, output: &str) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let stem = format!("{:03}-{}-attempt-{}", seq, phase, attempt);
        let prompt_file = self.dir.join(format!("{}-prompt.md", stem));
        let output_file = self.dir.join(format!("{}-output.log", stem));

        let written = std::fs::write(&prompt_file, prompt.combined())
            .and_then(|_| std::fs::write(&output_file, output));
        match written {
            Ok(()) => debug!(file = %output_file.display(), "Recorded transcript"),
            Err(e) => warn!(error = %e, dir = %self.dir.display(), "Failed to write transcript"),
        }
    }
}

/// [`AgentPort`] backed by a text generator.
///
/// Each call renders a prompt, generates text, parses it into the typed
/// response and checks it with [`schema::conform`]. Malformed output and
/// transient generator errors consume attempts; after `max_attempts` the call
/// fails with [`AgentError::GenerationFailure`]. Permanent generator errors
/// (bad credentials, missing binary) fail immediately.
pub struct GenerativeAgentPort {
    generator: Arc<dyn TextGenerator>,
    max_attempts: u32,
    retry_backoff: Duration,
    transcripts: Option<TranscriptLog>,
}

impl GenerativeAgentPort {
    pub fn new(generator: Arc<dyn TextGenerator>, max_attempts: u32) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            transcripts: None,
        }
    }

    pub fn with_transcripts(mut self, transcripts: TranscriptLog) -> Self {
        self.transcripts = Some(transcripts);
        self
    }

    /// Delay before retrying after a transient generator error, scaled by
    /// the attempt number.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

fn parse_response(phase: PhaseKind, text: &str) -> Result<AgentResponse, SchemaViolation> {
    Ok(match phase {
        PhaseKind::Clarify => AgentResponse::Clarify(parse::parse_clarify(text)?),
        PhaseKind::Plan => AgentResponse::Plan(parse::parse_plan(text)?),
        PhaseKind::Implement => AgentResponse::Implement(parse::parse_implement(text)?),
        PhaseKind::Validate => AgentResponse::Validate(parse::parse_validate(text)?),
        PhaseKind::Guide => AgentResponse::Guide(parse::parse_guide(text)?),
    })
}

/// Append the reason the previous attempt was rejected.
fn corrective(prompt: &Prompt, rejection: &str) -> Prompt {
    Prompt::new(
        prompt.system.clone(),
        format!(
            "{}\n\nYour previous response was rejected: {}\nFollow the required output format exactly.",
            prompt.user, rejection
        ),
    )
}

#[async_trait]
impl AgentPort for GenerativeAgentPort {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        let phase = request.phase();
        let prompt = prompts::render(&request);
        let mut rejection: Option<String> = None;
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            let attempt_prompt = match &rejection {
                Some(reason) => corrective(&prompt, reason),
                None => prompt.clone(),
            };

            info!(
                phase = %phase,
                attempt,
                backend = self.generator.name(),
                "Invoking agent"
            );

            let text = match self.generator.generate(&attempt_prompt).await {
                Ok(text) => text,
                Err(e) if e.is_transient() => {
                    warn!(phase = %phase, attempt, error = %e, "Transient generator error");
                    last_error = e.to_string();
                    if attempt < self.max_attempts && !self.retry_backoff.is_zero() {
                        tokio::time::sleep(self.retry_backoff * attempt).await;
                    }
                    continue;
                }
                Err(e) => {
                    return Err(AgentError::GenerationFailure {
                        phase,
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
            };

            if let Some(log) = &self.transcripts {
                log.record(phase, attempt, &attempt_prompt, &text);
            }

            match parse_response(phase, &text).and_then(|r| schema::conform(&request, r)) {
                Ok(response) => return Ok(response),
                Err(violation) => {
                    warn!(
                        phase = %phase,
                        attempt,
                        reason = %violation.message,
                        output = %truncate_for_log(&text, 200),
                        "Rejected agent output"
                    );
                    last_error = violation.to_string();
                    rejection = Some(violation.message);
                }
            }
        }

        Err(AgentError::GenerationFailure {
            phase,
            attempts: self.max_attempts,
            last_error,
        })
    }
}
