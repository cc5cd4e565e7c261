//! The build pipeline: state record, stage machine, clarification gate and
//! the orchestrator that drives them.

pub mod gate;
pub mod machine;
pub mod outcome;
pub mod runner;
pub mod state;

/// Upper bound on Implement attempts per build.
pub const MAX_ITERATIONS: u32 = 3;

pub use gate::{DEFAULT_ANSWER, GateOutcome};
pub use machine::{PipelineMachine, PipelineStage, StageEvent, Transition};
pub use outcome::{BuildOutcome, DegradedSuccess, FailureReason};
pub use runner::{Orchestrator, OrchestratorOptions};
pub use state::{BuildState, FinalStatus};
