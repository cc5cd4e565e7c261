//! Player-facing "how to run and play" instructions.

use tracing::info;

use super::{call, mismatch};
use crate::agent::{AgentPort, AgentRequest, AgentResponse, GuideRequest, PhaseKind};
use crate::errors::PhaseError;
use crate::orchestrator::BuildState;

/// Ask the agent for a run guide covering the generated files.
pub async fn run(port: &dyn AgentPort, state: &BuildState) -> Result<String, PhaseError> {
    let request = AgentRequest::Guide(GuideRequest {
        prompt: state.original_prompt().to_string(),
        game_type: state.game_type()?.to_string(),
        complexity: state.complexity()?,
        blueprint: state.blueprint()?.clone(),
        file_names: state.files()?.keys().cloned().collect(),
    });

    let response = match call(port, request).await? {
        AgentResponse::Guide(r) => r,
        other => return Err(mismatch(PhaseKind::Guide, &other)),
    };

    info!(chars = response.instructions.len(), "Run guide written");
    Ok(response.instructions)
}

/// Static guide used when the agent could not write one.
pub fn fallback_guide(state: &BuildState) -> String {
    let title = state.game_type().unwrap_or("browser game");
    let mut guide = format!("# How to play your {}\n\n", title);

    guide.push_str("## Running the game\n\n");
    let entry = state
        .files()
        .ok()
        .and_then(|files| files.keys().find(|n| n.ends_with(".html")).cloned())
        .unwrap_or_else(|| "index.html".to_string());
    guide.push_str(&format!(
        "Open `{}` in a modern web browser. No server or build step is needed.\n\n",
        entry
    ));

    if let Some(controls) = state.blueprint().ok().and_then(|b| b.section("controls")) {
        guide.push_str("## Controls\n\n");
        match controls {
            serde_json::Value::String(text) => guide.push_str(text),
            other => guide.push_str(&serde_json::to_string_pretty(other).unwrap_or_default()),
        }
        guide.push_str("\n\n");
    }

    guide.push_str("## Your idea\n\n");
    guide.push_str(state.original_prompt().trim());
    guide.push('\n');
    guide
}
