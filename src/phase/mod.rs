//! Phase runners.
//!
//! Each runner assembles a typed request from [`BuildState`], calls the
//! [`AgentPort`], re-checks the response against the shared schema and
//! merges it back into the state. Runners never decide what happens next;
//! that is the orchestrator's job.
//!
//! [`BuildState`]: crate::orchestrator::BuildState
//! [`AgentPort`]: crate::agent::AgentPort

pub mod clarify;
pub mod guide;
pub mod implement;
pub mod plan;
pub mod validate;

use crate::agent::{AgentPort, AgentRequest, AgentResponse, PhaseKind, schema};
use crate::errors::{AgentError, PhaseError};

/// Invoke the port and re-apply the schema to whatever came back.
///
/// Ports are trusted to validate, but the state's invariants depend on it,
/// so the check is repeated here for every implementation. `conform` is
/// idempotent; an already conformed response comes back unchanged and
/// logs nothing.
pub(crate) async fn call(
    port: &dyn AgentPort,
    request: AgentRequest,
) -> Result<AgentResponse, PhaseError> {
    let response = port.invoke(request.clone()).await?;
    if response.phase() != request.phase() {
        return Err(AgentError::MismatchedResponse {
            phase: request.phase(),
            got: response.phase(),
        }
        .into());
    }
    schema::conform(&request, response).map_err(|v| PhaseError::Agent(v.into()))
}

/// Build the mismatch error for a response variant the caller did not expect.
pub(crate) fn mismatch(expected: PhaseKind, response: &AgentResponse) -> PhaseError {
    AgentError::MismatchedResponse {
        phase: expected,
        got: response.phase(),
    }
    .into()
}
