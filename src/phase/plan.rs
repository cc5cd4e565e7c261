use tracing::info;

use super::{call, mismatch};
use crate::agent::{AgentPort, AgentRequest, AgentResponse, PhaseKind, PlanRequest};
use crate::errors::{PhaseError, StateError};
use crate::orchestrator::BuildState;

/// Turn the prompt and the full question/answer set into a blueprint.
///
/// Refuses to call the agent while any question is unanswered.
pub async fn run(port: &dyn AgentPort, state: &mut BuildState) -> Result<(), PhaseError> {
    let questions = state.questions()?.to_vec();
    if !state.answers_complete() {
        return Err(StateError::AnswersIncomplete {
            answered: state.answers().len(),
            expected: questions.len(),
        }
        .into());
    }

    let request = AgentRequest::Plan(PlanRequest {
        prompt: state.original_prompt().to_string(),
        game_type: state.game_type()?.to_string(),
        complexity: state.complexity()?,
        questions,
        answers: state.answers().to_vec(),
    });

    let response = match call(port, request).await? {
        AgentResponse::Plan(r) => r,
        other => return Err(mismatch(PhaseKind::Plan, &other)),
    };

    info!(
        sections = response.blueprint.sections().len(),
        "Blueprint drafted"
    );
    state.set_blueprint(response.blueprint)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Blueprint, PlanResponse, ScriptedPort};
    use crate::errors::AgentError;
    use crate::phase::test_support;

    fn answered() -> BuildState {
        let mut state = BuildState::new("space shooter");
        state
            .record_clarification(
                "shooter".into(),
                crate::agent::Complexity::High,
                vec!["Lives?".into(), "Bosses?".into(), "Power-ups?".into()],
            )
            .unwrap();
        for a in ["3", "yes", "shield"] {
            state.push_answer(a.into()).unwrap();
        }
        state
    }

    #[tokio::test]
    async fn sends_questions_with_answers() {
        let port = ScriptedPort::new();
        port.push(test_support::plan());
        let mut state = answered();

        run(&port, &mut state).await.unwrap();

        assert!(state.blueprint().unwrap().missing_sections().is_empty());
        match &port.requests()[0] {
            AgentRequest::Plan(r) => {
                assert_eq!(r.game_type, "shooter");
                assert_eq!(r.questions.len(), r.answers.len());
                assert_eq!(r.answers[2], "shield");
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[tokio::test]
    async fn unanswered_questions_block_planning() {
        let port = ScriptedPort::new();
        let mut state = BuildState::new("space shooter");
        state
            .record_clarification(
                "shooter".into(),
                crate::agent::Complexity::Low,
                vec!["a?".into(), "b?".into(), "c?".into()],
            )
            .unwrap();
        state.push_answer("x".into()).unwrap();

        let err = run(&port, &mut state).await.unwrap_err();
        assert!(matches!(
            err,
            PhaseError::State(StateError::AnswersIncomplete {
                answered: 1,
                expected: 3
            })
        ));
        assert_eq!(port.calls(PhaseKind::Plan), 0);
    }

    #[tokio::test]
    async fn incomplete_blueprint_is_rejected() {
        let port = ScriptedPort::new();
        port.push(AgentResponse::Plan(PlanResponse {
            blueprint: Blueprint::default(),
        }));
        let mut state = answered();
        let err = run(&port, &mut state).await.unwrap_err();
        assert!(matches!(err, PhaseError::Agent(AgentError::Schema(_))));
        assert!(state.blueprint().is_err());
    }
}
