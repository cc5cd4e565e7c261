//! The single mutable record threaded through a build.
//!
//! Fields are private; every mutator checks the invariant it could break
//! and every accessor for phase-populated data fails with
//! [`StateError::Unpopulated`] instead of returning a default.

use serde::{Deserialize, Serialize};

use super::MAX_ITERATIONS;
use crate::agent::{Blueprint, Complexity, FileSet, Verdict};
use crate::errors::StateError;

/// How a build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    Success,
    SuccessWithWarning,
    Failed,
}

impl std::fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalStatus::Success => write!(f, "SUCCESS"),
            FinalStatus::SuccessWithWarning => write!(f, "SUCCESS_WITH_WARNING"),
            FinalStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildState {
    original_prompt: String,
    detected_game_type: Option<String>,
    complexity_level: Option<Complexity>,
    clarification_questions: Option<Vec<String>>,
    clarification_answers: Vec<String>,
    blueprint: Option<Blueprint>,
    generated_files: Option<FileSet>,
    /// Iteration whose output `generated_files` holds.
    #[serde(skip)]
    files_iteration: u32,
    validation_verdict: Option<Verdict>,
    validation_feedback: Vec<String>,
    validation_suggestions: Vec<String>,
    iteration_count: u32,
    final_status: Option<FinalStatus>,
}

impl BuildState {
    pub fn new(original_prompt: impl Into<String>) -> Self {
        Self {
            original_prompt: original_prompt.into(),
            detected_game_type: None,
            complexity_level: None,
            clarification_questions: None,
            clarification_answers: Vec::new(),
            blueprint: None,
            generated_files: None,
            files_iteration: 0,
            validation_verdict: None,
            validation_feedback: Vec::new(),
            validation_suggestions: Vec::new(),
            iteration_count: 0,
            final_status: None,
        }
    }

    // ── accessors ───────────────────────────────────────────────────────

    pub fn original_prompt(&self) -> &str {
        &self.original_prompt
    }

    pub fn game_type(&self) -> Result<&str, StateError> {
        self.detected_game_type
            .as_deref()
            .ok_or(StateError::Unpopulated("detected_game_type"))
    }

    pub fn complexity(&self) -> Result<Complexity, StateError> {
        self.complexity_level
            .ok_or(StateError::Unpopulated("complexity_level"))
    }

    pub fn questions(&self) -> Result<&[String], StateError> {
        self.clarification_questions
            .as_deref()
            .ok_or(StateError::Unpopulated("clarification_questions"))
    }

    pub fn answers(&self) -> &[String] {
        &self.clarification_answers
    }

    /// True once every clarification question has an answer.
    pub fn answers_complete(&self) -> bool {
        self.clarification_questions
            .as_ref()
            .is_some_and(|q| q.len() == self.clarification_answers.len())
    }

    pub fn blueprint(&self) -> Result<&Blueprint, StateError> {
        self.blueprint
            .as_ref()
            .ok_or(StateError::Unpopulated("blueprint"))
    }

    pub fn files(&self) -> Result<&FileSet, StateError> {
        self.generated_files
            .as_ref()
            .ok_or(StateError::Unpopulated("generated_files"))
    }

    pub fn verdict(&self) -> Result<Verdict, StateError> {
        self.validation_verdict
            .ok_or(StateError::Unpopulated("validation_verdict"))
    }

    /// Feedback from the most recent validation; empty before the first one.
    pub fn feedback(&self) -> &[String] {
        &self.validation_feedback
    }

    pub fn suggestions(&self) -> &[String] {
        &self.validation_suggestions
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn final_status(&self) -> Option<FinalStatus> {
        self.final_status
    }

    // ── mutators ────────────────────────────────────────────────────────

    /// Store the clarifier's analysis. Allowed once.
    pub fn record_clarification(
        &mut self,
        game_type: String,
        complexity: Complexity,
        questions: Vec<String>,
    ) -> Result<(), StateError> {
        if self.clarification_questions.is_some() {
            return Err(StateError::AlreadySet("clarification_questions"));
        }
        self.detected_game_type = Some(game_type);
        self.complexity_level = Some(complexity);
        self.clarification_questions = Some(questions);
        Ok(())
    }

    /// Append the answer to the next unanswered question.
    pub fn push_answer(&mut self, answer: String) -> Result<(), StateError> {
        let expected = self.questions()?.len();
        if self.clarification_answers.len() >= expected {
            return Err(StateError::TooManyAnswers {
                given: self.clarification_answers.len() + 1,
                expected,
            });
        }
        self.clarification_answers.push(answer);
        Ok(())
    }

    /// Store the blueprint. Requires every question answered; allowed once.
    pub fn set_blueprint(&mut self, blueprint: Blueprint) -> Result<(), StateError> {
        let expected = self.questions()?.len();
        if self.clarification_answers.len() != expected {
            return Err(StateError::AnswersIncomplete {
                answered: self.clarification_answers.len(),
                expected,
            });
        }
        if self.blueprint.is_some() {
            return Err(StateError::AlreadySet("blueprint"));
        }
        self.blueprint = Some(blueprint);
        Ok(())
    }

    /// Count a new implement attempt and return its 1-based number.
    pub fn begin_iteration(&mut self) -> Result<u32, StateError> {
        if self.iteration_count >= MAX_ITERATIONS {
            return Err(StateError::IterationBoundReached {
                max: MAX_ITERATIONS,
            });
        }
        self.iteration_count += 1;
        Ok(self.iteration_count)
    }

    /// Replace the generated files wholesale with the current iteration's output.
    pub fn replace_files(&mut self, files: FileSet) -> Result<(), StateError> {
        if self.iteration_count == 0 || self.files_iteration == self.iteration_count {
            return Err(StateError::FilesOutsideIteration);
        }
        if files.is_empty() {
            return Err(StateError::EmptyFiles);
        }
        self.generated_files = Some(files);
        self.files_iteration = self.iteration_count;
        Ok(())
    }

    /// Replace the verdict, feedback and suggestions of the last validation.
    pub fn record_verdict(
        &mut self,
        verdict: Verdict,
        feedback: Vec<String>,
        suggestions: Vec<String>,
    ) -> Result<(), StateError> {
        if self.generated_files.as_ref().is_none_or(|f| f.is_empty()) {
            return Err(StateError::VerdictWithoutFiles);
        }
        self.validation_verdict = Some(verdict);
        self.validation_feedback = feedback;
        self.validation_suggestions = suggestions;
        Ok(())
    }

    /// Set the terminal status. Allowed once, and only when the status is
    /// consistent with the last verdict and the iteration count.
    pub fn finalize(&mut self, status: FinalStatus) -> Result<(), StateError> {
        if self.final_status.is_some() {
            return Err(StateError::AlreadySet("final_status"));
        }
        let illegal = |reason: &str| StateError::IllegalFinalStatus {
            status: status.to_string(),
            reason: reason.to_string(),
        };
        match status {
            FinalStatus::Success => {
                if self.validation_verdict != Some(Verdict::Pass) {
                    return Err(illegal("last verdict is not PASS"));
                }
            }
            FinalStatus::SuccessWithWarning => {
                if self.validation_verdict != Some(Verdict::Fail) {
                    return Err(illegal("last verdict is not FAIL"));
                }
                if self.iteration_count != MAX_ITERATIONS {
                    return Err(illegal("iteration budget not exhausted"));
                }
            }
            FinalStatus::Failed => {}
        }
        self.final_status = Some(status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn files(names: &[&str]) -> FileSet {
        names
            .iter()
            .map(|n| (n.to_string(), format!("// {}", n)))
            .collect()
    }

    fn clarified(questions: usize) -> BuildState {
        let mut state = BuildState::new("a breakout clone");
        state
            .record_clarification(
                "arcade".into(),
                Complexity::Low,
                (0..questions).map(|i| format!("Q{}?", i)).collect(),
            )
            .unwrap();
        state
    }

    fn planned() -> BuildState {
        let mut state = clarified(3);
        for _ in 0..3 {
            state.push_answer("yes".into()).unwrap();
        }
        state
            .set_blueprint(Blueprint::from_sections(BTreeMap::new()))
            .unwrap();
        state
    }

    #[test]
    fn unpopulated_fields_fail_fast() {
        let state = BuildState::new("pong");
        assert_eq!(state.original_prompt(), "pong");
        assert_eq!(
            state.blueprint().unwrap_err(),
            StateError::Unpopulated("blueprint")
        );
        assert_eq!(
            state.files().unwrap_err(),
            StateError::Unpopulated("generated_files")
        );
        assert!(state.verdict().is_err());
        assert!(state.game_type().is_err());
        assert!(!state.answers_complete());
    }

    #[test]
    fn clarification_is_write_once() {
        let mut state = clarified(3);
        let err = state
            .record_clarification("x".into(), Complexity::High, vec![])
            .unwrap_err();
        assert_eq!(err, StateError::AlreadySet("clarification_questions"));
    }

    #[test]
    fn answers_never_exceed_questions() {
        let mut state = clarified(3);
        for _ in 0..3 {
            state.push_answer("a".into()).unwrap();
        }
        assert!(state.answers_complete());
        assert_eq!(
            state.push_answer("extra".into()).unwrap_err(),
            StateError::TooManyAnswers {
                given: 4,
                expected: 3
            }
        );
    }

    #[test]
    fn answer_before_questions_is_contract_error() {
        let mut state = BuildState::new("pong");
        assert_eq!(
            state.push_answer("a".into()).unwrap_err(),
            StateError::Unpopulated("clarification_questions")
        );
    }

    #[test]
    fn blueprint_requires_all_answers() {
        let mut state = clarified(4);
        state.push_answer("a".into()).unwrap();
        let err = state
            .set_blueprint(Blueprint::from_sections(BTreeMap::new()))
            .unwrap_err();
        assert_eq!(
            err,
            StateError::AnswersIncomplete {
                answered: 1,
                expected: 4
            }
        );
    }

    #[test]
    fn iteration_count_is_bounded() {
        let mut state = planned();
        for expected in 1..=MAX_ITERATIONS {
            assert_eq!(state.begin_iteration().unwrap(), expected);
            state.replace_files(files(&["game.js"])).unwrap();
        }
        assert_eq!(
            state.begin_iteration().unwrap_err(),
            StateError::IterationBoundReached { max: 3 }
        );
        assert_eq!(state.iteration_count(), MAX_ITERATIONS);
    }

    #[test]
    fn files_are_replaced_not_merged() {
        let mut state = planned();
        state.begin_iteration().unwrap();
        state
            .replace_files(files(&["index.html", "old.js"]))
            .unwrap();
        state.begin_iteration().unwrap();
        state.replace_files(files(&["index.html"])).unwrap();
        let current = state.files().unwrap();
        assert_eq!(current.len(), 1);
        assert!(!current.contains_key("old.js"));
    }

    #[test]
    fn files_only_once_per_iteration() {
        let mut state = planned();
        assert_eq!(
            state.replace_files(files(&["a.js"])).unwrap_err(),
            StateError::FilesOutsideIteration
        );
        state.begin_iteration().unwrap();
        assert_eq!(
            state.replace_files(FileSet::new()).unwrap_err(),
            StateError::EmptyFiles
        );
        state.replace_files(files(&["a.js"])).unwrap();
        assert_eq!(
            state.replace_files(files(&["b.js"])).unwrap_err(),
            StateError::FilesOutsideIteration
        );
    }

    #[test]
    fn verdict_requires_files() {
        let mut state = planned();
        assert_eq!(
            state
                .record_verdict(Verdict::Pass, vec![], vec![])
                .unwrap_err(),
            StateError::VerdictWithoutFiles
        );
    }

    #[test]
    fn success_requires_pass() {
        let mut state = planned();
        state.begin_iteration().unwrap();
        state.replace_files(files(&["game.js"])).unwrap();
        state
            .record_verdict(Verdict::Fail, vec!["broken".into()], vec![])
            .unwrap();
        assert!(matches!(
            state.finalize(FinalStatus::Success),
            Err(StateError::IllegalFinalStatus { .. })
        ));
        // budget not exhausted either
        assert!(state.finalize(FinalStatus::SuccessWithWarning).is_err());
        state.finalize(FinalStatus::Failed).unwrap();
        assert_eq!(state.final_status(), Some(FinalStatus::Failed));
    }

    #[test]
    fn final_status_is_set_once() {
        let mut state = planned();
        state.begin_iteration().unwrap();
        state.replace_files(files(&["game.js"])).unwrap();
        state.record_verdict(Verdict::Pass, vec![], vec![]).unwrap();
        state.finalize(FinalStatus::Success).unwrap();
        assert_eq!(
            state.finalize(FinalStatus::Failed).unwrap_err(),
            StateError::AlreadySet("final_status")
        );
    }

    #[test]
    fn warning_requires_exhausted_budget_and_fail() {
        let mut state = planned();
        for _ in 0..MAX_ITERATIONS {
            state.begin_iteration().unwrap();
            state.replace_files(files(&["game.js"])).unwrap();
            state
                .record_verdict(Verdict::Fail, vec!["still broken".into()], vec![])
                .unwrap();
        }
        state.finalize(FinalStatus::SuccessWithWarning).unwrap();
        assert_eq!(state.feedback(), ["still broken".to_string()]);
    }

    #[test]
    fn serializes_camel_case() {
        let state = planned();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["originalPrompt"], "a breakout clone");
        assert_eq!(json["iterationCount"], 0);
        assert!(json.get("filesIteration").is_none());
    }
}
