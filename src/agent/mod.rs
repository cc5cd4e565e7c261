//! Typed agent calls.
//!
//! Every generative step goes through one calling convention: an
//! [`AgentRequest`] goes in, an [`AgentResponse`] of the matching kind comes
//! out. [`GenerativeAgentPort`] implements this on top of a raw
//! [`crate::generator::TextGenerator`]; tests substitute [`ScriptedPort`].

pub mod generative;
pub mod parse;
pub mod prompts;
pub mod schema;
pub mod scripted;
pub mod types;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AgentError;

pub use generative::{GenerativeAgentPort, TranscriptLog};
pub use scripted::ScriptedPort;
pub use types::{
    Blueprint, ClarifyRequest, ClarifyResponse, Complexity, FileSet, GuideRequest, GuideResponse,
    ImplementRequest, ImplementResponse, PlanRequest, PlanResponse, ValidateRequest,
    ValidateResponse, Verdict,
};

/// The kind of agent call, used for dispatch, logging and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Clarify,
    Plan,
    Implement,
    Validate,
    Guide,
}

impl PhaseKind {
    /// Human-readable agent role shown in the UI.
    pub fn role(&self) -> &'static str {
        match self {
            PhaseKind::Clarify => "Requirements Analyst",
            PhaseKind::Plan => "Game Architect",
            PhaseKind::Implement => "Game Developer",
            PhaseKind::Validate => "QA Reviewer",
            PhaseKind::Guide => "Build Manager",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::Clarify => write!(f, "clarify"),
            PhaseKind::Plan => write!(f, "plan"),
            PhaseKind::Implement => write!(f, "implement"),
            PhaseKind::Validate => write!(f, "validate"),
            PhaseKind::Guide => write!(f, "guide"),
        }
    }
}

/// A typed request for one agent call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AgentRequest {
    Clarify(ClarifyRequest),
    Plan(PlanRequest),
    Implement(ImplementRequest),
    Validate(ValidateRequest),
    Guide(GuideRequest),
}

impl AgentRequest {
    pub fn phase(&self) -> PhaseKind {
        match self {
            AgentRequest::Clarify(_) => PhaseKind::Clarify,
            AgentRequest::Plan(_) => PhaseKind::Plan,
            AgentRequest::Implement(_) => PhaseKind::Implement,
            AgentRequest::Validate(_) => PhaseKind::Validate,
            AgentRequest::Guide(_) => PhaseKind::Guide,
        }
    }
}

/// A typed response from one agent call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AgentResponse {
    Clarify(ClarifyResponse),
    Plan(PlanResponse),
    Implement(ImplementResponse),
    Validate(ValidateResponse),
    Guide(GuideResponse),
}

impl AgentResponse {
    pub fn phase(&self) -> PhaseKind {
        match self {
            AgentResponse::Clarify(_) => PhaseKind::Clarify,
            AgentResponse::Plan(_) => PhaseKind::Plan,
            AgentResponse::Implement(_) => PhaseKind::Implement,
            AgentResponse::Validate(_) => PhaseKind::Validate,
            AgentResponse::Guide(_) => PhaseKind::Guide,
        }
    }
}

/// Uniform capability for all generative phases.
///
/// Implementations must return a response of the same kind as the request,
/// already checked with [`schema::conform`], or an [`AgentError`] once their
/// internal retry budget is spent.
#[async_trait]
pub trait AgentPort: Send + Sync {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentResponse, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_and_response_kinds_line_up() {
        let req = AgentRequest::Clarify(ClarifyRequest {
            prompt: "snake".into(),
        });
        let resp = AgentResponse::Guide(GuideResponse {
            instructions: "open index.html".into(),
        });
        assert_eq!(req.phase(), PhaseKind::Clarify);
        assert_eq!(resp.phase(), PhaseKind::Guide);
    }

    #[test]
    fn phase_kind_display_is_lowercase() {
        assert_eq!(PhaseKind::Implement.to_string(), "implement");
        assert_eq!(PhaseKind::Validate.role(), "QA Reviewer");
    }

    #[test]
    fn request_serializes_with_kind_tag() {
        let req = AgentRequest::Clarify(ClarifyRequest {
            prompt: "pong".into(),
        });
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["kind"], "clarify");
        assert_eq!(json["prompt"], "pong");
    }
}
