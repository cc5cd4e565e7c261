use tracing::info;

use super::{call, mismatch};
use crate::agent::{AgentPort, AgentRequest, AgentResponse, PhaseKind, ValidateRequest, Verdict};
use crate::errors::PhaseError;
use crate::orchestrator::BuildState;

/// Review the current files against the blueprint and record the verdict.
pub async fn run(port: &dyn AgentPort, state: &mut BuildState) -> Result<Verdict, PhaseError> {
    let request = AgentRequest::Validate(ValidateRequest {
        files: state.files()?.clone(),
        blueprint: state.blueprint()?.clone(),
    });

    let response = match call(port, request).await? {
        AgentResponse::Validate(r) => r,
        other => return Err(mismatch(PhaseKind::Validate, &other)),
    };

    let verdict = response.verdict;
    info!(
        iteration = state.iteration_count(),
        verdict = %verdict,
        feedback = response.feedback.len(),
        suggestions = response.suggestions.len(),
        "Validation complete"
    );
    state.record_verdict(verdict, response.feedback, response.suggestions)?;
    Ok(verdict)
}
