//! Structural validation shared by every agent response.
//!
//! `conform` either returns a normalized response (trimmed strings, blank
//! entries dropped, over-long question lists truncated) or a
//! [`SchemaViolation`] describing the first problem found.

use tracing::warn;

use super::types::{
    ClarifyResponse, GuideResponse, ImplementRequest, ImplementResponse, PlanResponse,
    ValidateResponse, Verdict,
};
use super::{AgentRequest, AgentResponse, PhaseKind};
use crate::errors::SchemaViolation;

/// Fewest clarification questions a clarifier may return.
pub const MIN_QUESTIONS: usize = 3;
/// Most clarification questions kept; extra ones are dropped with a warning.
pub const MAX_QUESTIONS: usize = 7;

/// Validate `response` against the schema implied by `request`.
///
/// Idempotent: a conformed response passes through unchanged, so the
/// truncation warning fires at most once per response however many layers
/// re-check it.
pub fn conform(
    request: &AgentRequest,
    response: AgentResponse,
) -> Result<AgentResponse, SchemaViolation> {
    match (request, response) {
        (AgentRequest::Clarify(_), AgentResponse::Clarify(r)) => {
            conform_clarify(r).map(AgentResponse::Clarify)
        }
        (AgentRequest::Plan(_), AgentResponse::Plan(r)) => conform_plan(r).map(AgentResponse::Plan),
        (AgentRequest::Implement(req), AgentResponse::Implement(r)) => {
            conform_implement(req, r).map(AgentResponse::Implement)
        }
        (AgentRequest::Validate(_), AgentResponse::Validate(r)) => {
            conform_validate(r).map(AgentResponse::Validate)
        }
        (AgentRequest::Guide(_), AgentResponse::Guide(r)) => {
            conform_guide(r).map(AgentResponse::Guide)
        }
        (req, resp) => Err(SchemaViolation::new(
            req.phase(),
            format!("expected a {} response, got {}", req.phase(), resp.phase()),
        )),
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn conform_clarify(mut r: ClarifyResponse) -> Result<ClarifyResponse, SchemaViolation> {
    r.game_type = r.game_type.trim().to_string();
    if r.game_type.is_empty() {
        return Err(SchemaViolation::new(
            PhaseKind::Clarify,
            "game type is empty",
        ));
    }

    r.questions = clean_list(r.questions);
    if r.questions.len() < MIN_QUESTIONS {
        return Err(SchemaViolation::new(
            PhaseKind::Clarify,
            format!(
                "expected {}-{} questions, got {}",
                MIN_QUESTIONS,
                MAX_QUESTIONS,
                r.questions.len()
            ),
        ));
    }
    if r.questions.len() > MAX_QUESTIONS {
        warn!(
            returned = r.questions.len(),
            kept = MAX_QUESTIONS,
            "Clarifier returned too many questions, truncating"
        );
        r.questions.truncate(MAX_QUESTIONS);
    }
    Ok(r)
}

fn conform_plan(r: PlanResponse) -> Result<PlanResponse, SchemaViolation> {
    let missing = r.blueprint.missing_sections();
    if !missing.is_empty() {
        return Err(SchemaViolation::new(
            PhaseKind::Plan,
            format!("blueprint is missing sections: {}", missing.join(", ")),
        ));
    }
    Ok(r)
}

/// A file name the sink can write without leaving the output directory.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
        && !name.chars().any(char::is_control)
}

fn conform_implement(
    req: &ImplementRequest,
    r: ImplementResponse,
) -> Result<ImplementResponse, SchemaViolation> {
    if r.files.is_empty() {
        return Err(SchemaViolation::new(
            PhaseKind::Implement,
            "no files were generated",
        ));
    }

    let mut files = super::types::FileSet::new();
    for (name, content) in r.files {
        let name = name.trim().to_string();
        if !is_plain_file_name(&name) {
            return Err(SchemaViolation::new(
                PhaseKind::Implement,
                format!("file name '{}' is not a plain file name", name),
            ));
        }
        if content.trim().is_empty() {
            return Err(SchemaViolation::new(
                PhaseKind::Implement,
                format!("file '{}' is empty", name),
            ));
        }
        files.insert(name, content);
    }

    let missing: Vec<&str> = req
        .required_files
        .iter()
        .filter(|f| !files.contains_key(f.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(SchemaViolation::new(
            PhaseKind::Implement,
            format!("required files missing: {}", missing.join(", ")),
        ));
    }

    Ok(ImplementResponse { files })
}

fn conform_validate(mut r: ValidateResponse) -> Result<ValidateResponse, SchemaViolation> {
    r.feedback = clean_list(r.feedback);
    r.suggestions = clean_list(r.suggestions);
    if r.verdict == Verdict::Fail && r.feedback.is_empty() {
        return Err(SchemaViolation::new(
            PhaseKind::Validate,
            "FAIL verdict without any feedback",
        ));
    }
    Ok(r)
}

fn conform_guide(mut r: GuideResponse) -> Result<GuideResponse, SchemaViolation> {
    r.instructions = r.instructions.trim().to_string();
    if r.instructions.is_empty() {
        return Err(SchemaViolation::new(PhaseKind::Guide, "instructions are empty"));
    }
    Ok(r)
}
