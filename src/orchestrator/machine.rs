//! Pipeline stages and the transition table between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::MAX_ITERATIONS;
use crate::errors::OrchestratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    Clarifying,
    AwaitingAnswers,
    Planning,
    Implementing,
    Validating,
    Finalizing,
    Succeeded,
    SucceededWithWarning,
    Failed,
}

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::SucceededWithWarning | Self::Failed
        )
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Clarifying => "clarifying",
            Self::AwaitingAnswers => "awaiting_answers",
            Self::Planning => "planning",
            Self::Implementing => "implementing",
            Self::Validating => "validating",
            Self::Finalizing => "finalizing",
            Self::Succeeded => "succeeded",
            Self::SucceededWithWarning => "succeeded_with_warning",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Something that happened while in a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StageEvent {
    PromptReceived,
    Clarified,
    AnswersCollected,
    InputClosed,
    Planned,
    FilesGenerated,
    /// A validation verdict for the given 1-based iteration.
    Validated { pass: bool, iteration: u32 },
    /// The build is being closed out; `last_pass` is the final verdict.
    Finalized { last_pass: bool },
    /// A phase failed irrecoverably.
    Fatal,
}

impl std::fmt::Display for StageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PromptReceived => write!(f, "prompt_received"),
            Self::Clarified => write!(f, "clarified"),
            Self::AnswersCollected => write!(f, "answers_collected"),
            Self::InputClosed => write!(f, "input_closed"),
            Self::Planned => write!(f, "planned"),
            Self::FilesGenerated => write!(f, "files_generated"),
            Self::Validated { pass, iteration } => write!(
                f,
                "validated({}, iteration {})",
                if *pass { "PASS" } else { "FAIL" },
                iteration
            ),
            Self::Finalized { last_pass } => write!(f, "finalized(last_pass={})", last_pass),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// The transition table. `None` means the event is illegal in `from`.
pub fn transition(from: PipelineStage, event: StageEvent) -> Option<PipelineStage> {
    use PipelineStage as S;
    use StageEvent as E;

    match (from, event) {
        (s, _) if s.is_terminal() => None,
        (S::Init, E::Fatal) => None,
        (_, E::Fatal) => Some(S::Failed),
        (S::Init, E::PromptReceived) => Some(S::Clarifying),
        (S::Clarifying, E::Clarified) => Some(S::AwaitingAnswers),
        (S::AwaitingAnswers, E::AnswersCollected) => Some(S::Planning),
        (S::AwaitingAnswers, E::InputClosed) => Some(S::Failed),
        (S::Planning, E::Planned) => Some(S::Implementing),
        (S::Implementing, E::FilesGenerated) => Some(S::Validating),
        (S::Validating, E::Validated { pass: true, .. }) => Some(S::Finalizing),
        (S::Validating, E::Validated { pass: false, iteration }) => {
            if iteration >= MAX_ITERATIONS {
                Some(S::Finalizing)
            } else {
                Some(S::Implementing)
            }
        }
        (S::Finalizing, E::Finalized { last_pass: true }) => Some(S::Succeeded),
        (S::Finalizing, E::Finalized { last_pass: false }) => Some(S::SucceededWithWarning),
        _ => None,
    }
}

/// One recorded stage change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: PipelineStage,
    pub to: PipelineStage,
    pub event: StageEvent,
    pub iteration: u32,
    pub at: DateTime<Utc>,
}

/// Current stage plus the history of how it got there.
#[derive(Debug, Clone)]
pub struct PipelineMachine {
    stage: PipelineStage,
    log: Vec<Transition>,
}

impl Default for PipelineMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMachine {
    pub fn new() -> Self {
        Self {
            stage: PipelineStage::Init,
            log: Vec::new(),
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.log
    }

    pub fn into_transitions(self) -> Vec<Transition> {
        self.log
    }

    /// Apply `event`, recording the transition.
    pub fn fire(
        &mut self,
        event: StageEvent,
        iteration: u32,
    ) -> Result<PipelineStage, OrchestratorError> {
        let to = transition(self.stage, event).ok_or_else(|| {
            OrchestratorError::IllegalTransition {
                from: self.stage.to_string(),
                event: event.to_string(),
            }
        })?;
        debug!(from = %self.stage, to = %to, event = %event, iteration, "Stage transition");
        self.log.push(Transition {
            from: self.stage,
            to,
            event,
            iteration,
            at: Utc::now(),
        });
        self.stage = to;
        Ok(to)
    }
}
