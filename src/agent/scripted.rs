use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AgentPort, AgentRequest, AgentResponse, PhaseKind};
use crate::errors::AgentError;

type Script = HashMap<PhaseKind, VecDeque<Result<AgentResponse, AgentError>>>;

/// An [`AgentPort`] that replays queued responses per phase and records
/// every request it receives.
///
/// A phase whose queue is empty fails with
/// [`AgentError::GenerationFailure`].
#[derive(Default)]
pub struct ScriptedPort {
    script: Mutex<Script>,
    requests: Mutex<Vec<AgentRequest>>,
}

impl ScriptedPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the phase it belongs to.
    pub fn push(&self, response: AgentResponse) -> &Self {
        self.lock_script()
            .entry(response.phase())
            .or_default()
            .push_back(Ok(response));
        self
    }

    pub fn push_error(&self, phase: PhaseKind, error: AgentError) -> &Self {
        self.lock_script()
            .entry(phase)
            .or_default()
            .push_back(Err(error));
        self
    }

    /// All requests so far, in call order.
    pub fn requests(&self) -> Vec<AgentRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn requests_for(&self, phase: PhaseKind) -> Vec<AgentRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.phase() == phase)
            .collect()
    }

    pub fn calls(&self, phase: PhaseKind) -> usize {
        self.requests_for(phase).len()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AgentPort for ScriptedPort {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        let phase = request.phase();
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);
        self.lock_script()
            .get_mut(&phase)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(AgentError::GenerationFailure {
                    phase,
                    attempts: 1,
                    last_error: "no scripted response left".to_string(),
                })
            })
    }
}
