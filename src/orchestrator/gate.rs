//! The interactive clarification gate.

use tracing::{info, warn};

use super::state::BuildState;
use crate::errors::StateError;
use crate::gates::AnswerSource;
use crate::ui::BuildUI;

/// Substituted for blank answers.
pub const DEFAULT_ANSWER: &str = "No preference, use your best judgment.";

/// How answer collection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Every question has an answer.
    Complete,
    /// The source closed before all questions were answered.
    Closed { answered: usize, expected: usize },
}

/// Collect one answer per outstanding question, in order, appending each to
/// the state before asking the next.
pub async fn collect_answers(
    state: &mut BuildState,
    source: &mut dyn AnswerSource,
    ui: Option<&BuildUI>,
) -> Result<GateOutcome, StateError> {
    let questions = state.questions()?.to_vec();
    let expected = questions.len();

    for (index, question) in questions.iter().enumerate().skip(state.answers().len()) {
        let Some(answer) = source.next_answer(index, expected, question).await else {
            let answered = state.answers().len();
            warn!(answered, expected, "Answer input closed before all questions were answered");
            return Ok(GateOutcome::Closed { answered, expected });
        };

        let answer = match answer.trim() {
            "" => DEFAULT_ANSWER.to_string(),
            trimmed => trimmed.to_string(),
        };
        if let Some(ui) = ui {
            ui.show_answer(index, expected, question, &answer);
        }
        state.push_answer(answer)?;
    }

    info!(answers = expected, "Clarification answers collected");
    Ok(GateOutcome::Complete)
}
