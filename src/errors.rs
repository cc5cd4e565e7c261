//! Typed error hierarchy for the gamesmith pipeline.
//!
//! One enum per subsystem:
//! - `GeneratorError`: the external text generator (CLI process or HTTP API)
//! - `SchemaViolation` / `AgentError`: typed agent calls and their validation
//! - `StateError`: misuse of the shared `BuildState` record
//! - `PhaseError`: a single phase runner
//! - `OrchestratorError`: conditions that abort `Orchestrator::run` itself

use std::time::Duration;

use thiserror::Error;

use crate::agent::PhaseKind;

/// Errors raised by a [`crate::generator::TextGenerator`].
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Failed to spawn generator command `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Generator exited with non-zero code {exit_code}: {stderr}")]
    NonZeroExit { exit_code: i32, stderr: String },

    #[error("Generator timed out after {0:?}")]
    Timeout(Duration),

    #[error("{provider} rejected the credentials: {message}")]
    Auth { provider: String, message: String },

    #[error("{provider} quota exhausted: {message}")]
    Quota { provider: String, message: String },

    #[error("{provider} is unavailable: {message}")]
    Outage { provider: String, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Generator misconfigured: {0}")]
    Misconfiguration(String),

    #[error("Generator returned an empty response")]
    EmptyResponse,

    #[error("I/O error while talking to the generator: {0}")]
    Io(#[from] std::io::Error),
}

impl GeneratorError {
    /// Whether another attempt with the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NonZeroExit { .. }
                | Self::Timeout(_)
                | Self::Outage { .. }
                | Self::Transport(_)
                | Self::EmptyResponse
        )
    }
}

/// A generated response that failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{phase} response violates schema: {message}")]
pub struct SchemaViolation {
    pub phase: PhaseKind,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(phase: PhaseKind, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
        }
    }
}

/// Errors from an [`crate::agent::AgentPort`] invocation.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("{phase} generation failed after {attempts} attempt(s): {last_error}")]
    GenerationFailure {
        phase: PhaseKind,
        attempts: u32,
        last_error: String,
    },

    #[error("{phase} request was answered with a {got} response")]
    MismatchedResponse { phase: PhaseKind, got: PhaseKind },
}

impl AgentError {
    /// The phase whose call produced this error.
    pub fn phase(&self) -> PhaseKind {
        match self {
            Self::Schema(v) => v.phase,
            Self::GenerationFailure { phase, .. } | Self::MismatchedResponse { phase, .. } => {
                *phase
            }
        }
    }
}

/// Contract violations against the shared build state.
///
/// These indicate a bug in the orchestration code, never a generator problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Build state field `{0}` was read before any phase populated it")]
    Unpopulated(&'static str),

    #[error("Build state field `{0}` is write-once and already set")]
    AlreadySet(&'static str),

    #[error("Answer {given} supplied but only {expected} questions were asked")]
    TooManyAnswers { given: usize, expected: usize },

    #[error("Planning requires {expected} answers, only {answered} collected")]
    AnswersIncomplete { answered: usize, expected: usize },

    #[error("Iteration bound of {max} already reached")]
    IterationBoundReached { max: u32 },

    #[error("Generated files recorded outside an implement iteration")]
    FilesOutsideIteration,

    #[error("Implement phase produced no files")]
    EmptyFiles,

    #[error("Validation verdict recorded without generated files")]
    VerdictWithoutFiles,

    #[error("Final status {status} is not legal here: {reason}")]
    IllegalFinalStatus { status: String, reason: String },
}

/// Errors from running one phase.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Errors that abort the orchestrator instead of ending the build as FAILED.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Build state contract violated: {0}")]
    State(#[from] StateError),

    #[error("Illegal pipeline transition from {from} on {event}")]
    IllegalTransition { from: String, event: String },

    #[error("Failed to hand off build artifacts: {0}")]
    Sink(#[source] anyhow::Error),
}
