//! What a finished build hands back to its caller.

use serde::{Deserialize, Serialize};

use super::machine::Transition;
use super::state::{BuildState, FinalStatus};
use crate::agent::PhaseKind;
use crate::sink::BuildReport;

/// Why a build ended FAILED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The answer channel closed before every question was answered.
    IncompleteClarification { answered: usize, expected: usize },
    /// A phase could not get a usable response from the generator.
    GenerationFailure { phase: PhaseKind, detail: String },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompleteClarification { answered, expected } => write!(
                f,
                "clarification incomplete: {} of {} questions answered",
                answered, expected
            ),
            Self::GenerationFailure { phase, detail } => {
                write!(f, "{} phase failed: {}", phase, detail)
            }
        }
    }
}

/// Residual risk of a build that used up its iterations without a PASS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedSuccess {
    pub iterations: u32,
    pub outstanding_feedback: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub status: FinalStatus,
    pub state: BuildState,
    /// Set only when `status` is FAILED.
    pub failure: Option<FailureReason>,
    /// Set only when `status` is SUCCESS_WITH_WARNING.
    pub degraded: Option<DegradedSuccess>,
    pub transitions: Vec<Transition>,
    pub guide: Option<String>,
    pub report: BuildReport,
}

impl BuildOutcome {
    pub fn is_failed(&self) -> bool {
        self.status == FinalStatus::Failed
    }

    /// Names of the files that were handed to the sink.
    pub fn delivered_files(&self) -> Vec<String> {
        self.report.files.iter().map(|f| f.name.clone()).collect()
    }
}
