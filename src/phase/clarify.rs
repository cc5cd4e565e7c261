use tracing::info;

use super::{call, mismatch};
use crate::agent::{AgentPort, AgentRequest, AgentResponse, ClarifyRequest, PhaseKind};
use crate::errors::PhaseError;
use crate::orchestrator::BuildState;

/// Analyze the prompt and record game type, complexity and questions.
pub async fn run(port: &dyn AgentPort, state: &mut BuildState) -> Result<(), PhaseError> {
    let request = AgentRequest::Clarify(ClarifyRequest {
        prompt: state.original_prompt().to_string(),
    });

    let response = match call(port, request).await? {
        AgentResponse::Clarify(r) => r,
        other => return Err(mismatch(PhaseKind::Clarify, &other)),
    };

    info!(
        game_type = %response.game_type,
        complexity = %response.complexity,
        questions = response.questions.len(),
        "Clarification complete"
    );
    state.record_clarification(response.game_type, response.complexity, response.questions)?;
    Ok(())
}
