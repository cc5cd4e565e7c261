use tracing::info;

use super::{call, mismatch};
use crate::agent::{AgentPort, AgentRequest, AgentResponse, ImplementRequest, PhaseKind};
use crate::errors::PhaseError;
use crate::orchestrator::BuildState;

/// Start a new iteration and replace the generated files with its output.
///
/// From the second iteration on, the previous validation feedback is passed
/// along so the developer can address it. Returns the iteration number.
pub async fn run(
    port: &dyn AgentPort,
    state: &mut BuildState,
    required_files: &[String],
) -> Result<u32, PhaseError> {
    let game_type = state.game_type()?.to_string();
    let complexity = state.complexity()?;
    let blueprint = state.blueprint()?.clone();
    let iteration = state.begin_iteration()?;
    let prior_feedback = (iteration > 1).then(|| state.feedback().to_vec());

    let request = AgentRequest::Implement(ImplementRequest {
        game_type,
        complexity,
        blueprint,
        prior_feedback,
        iteration,
        required_files: required_files.to_vec(),
    });

    let response = match call(port, request).await? {
        AgentResponse::Implement(r) => r,
        other => return Err(mismatch(PhaseKind::Implement, &other)),
    };

    info!(
        iteration,
        files = response.files.len(),
        bytes = response.files.values().map(String::len).sum::<usize>(),
        "Game files generated"
    );
    state.replace_files(response.files)?;
    Ok(iteration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ScriptedPort, Verdict};
    use crate::errors::{AgentError, StateError};
    use crate::orchestrator::MAX_ITERATIONS;
    use crate::phase::test_support;

    fn required() -> Vec<String> {
        crate::smith_config::default_required_files()
    }

    fn planned() -> BuildState {
        let mut state = BuildState::new("snake");
        state
            .record_clarification(
                "arcade".into(),
                crate::agent::Complexity::Low,
                vec!["a?".into(), "b?".into(), "c?".into()],
            )
            .unwrap();
        for _ in 0..3 {
            state.push_answer("ok".into()).unwrap();
        }
        state.set_blueprint(test_support::blueprint()).unwrap();
        state
    }

    #[tokio::test]
    async fn first_iteration_has_no_prior_feedback() {
        let port = ScriptedPort::new();
        port.push(test_support::implement("v1"));
        let mut state = planned();

        assert_eq!(run(&port, &mut state, &required()).await.unwrap(), 1);
        match &port.requests()[0] {
            AgentRequest::Implement(r) => {
                assert_eq!(r.iteration, 1);
                assert!(r.prior_feedback.is_none());
                assert_eq!(r.required_files, required());
            }
            other => panic!("unexpected request {other:?}"),
        }
        assert!(state.files().unwrap()["game.js"].contains("v1"));
    }

    #[tokio::test]
    async fn later_iterations_carry_feedback_and_replace_files() {
        let port = ScriptedPort::new();
        port.push(test_support::implement("v1"));
        port.push(test_support::implement("v2"));
        let mut state = planned();

        run(&port, &mut state, &required()).await.unwrap();
        state
            .record_verdict(Verdict::Fail, vec!["Error: no score".into()], vec![])
            .unwrap();
        assert_eq!(run(&port, &mut state, &required()).await.unwrap(), 2);

        match &port.requests()[1] {
            AgentRequest::Implement(r) => {
                assert_eq!(r.prior_feedback.as_deref(), Some(&["Error: no score".to_string()][..]));
            }
            other => panic!("unexpected request {other:?}"),
        }
        assert!(state.files().unwrap()["game.js"].contains("v2"));
        assert_eq!(state.iteration_count(), 2);
    }

    #[tokio::test]
    async fn failed_generation_still_counts_the_iteration() {
        let port = ScriptedPort::new();
        port.push_error(
            PhaseKind::Implement,
            AgentError::GenerationFailure {
                phase: PhaseKind::Implement,
                attempts: 3,
                last_error: "timeout".into(),
            },
        );
        let mut state = planned();
        assert!(run(&port, &mut state, &required()).await.is_err());
        assert_eq!(state.iteration_count(), 1);
        assert!(state.files().is_err());
    }

    #[tokio::test]
    async fn refuses_to_exceed_the_bound() {
        let port = ScriptedPort::new();
        let mut state = planned();
        for i in 0..MAX_ITERATIONS {
            port.push(test_support::implement(&format!("v{}", i)));
            run(&port, &mut state, &required()).await.unwrap();
        }
        let err = run(&port, &mut state, &required()).await.unwrap_err();
        assert!(matches!(
            err,
            PhaseError::State(StateError::IterationBoundReached { .. })
        ));
        assert_eq!(port.calls(PhaseKind::Implement), MAX_ITERATIONS as usize);
    }
}
