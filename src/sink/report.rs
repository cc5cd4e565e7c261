use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::agent::{Complexity, FileSet};
use crate::orchestrator::{BuildState, FailureReason, FinalStatus, Transition};

/// Size and digest of one delivered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub bytes: usize,
    pub sha256: String,
}

impl FileRecord {
    pub fn new(name: &str, content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self {
            name: name.to_string(),
            bytes: content.len(),
            sha256: format!("{:x}", hasher.finalize()),
        }
    }
}

/// Machine-readable summary of one build, written as `build-report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    pub status: FinalStatus,
    pub iterations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outstanding_feedback: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    pub transitions: Vec<Transition>,
    pub files: Vec<FileRecord>,
}

impl BuildReport {
    /// Summarize a finished build. `delivered` is what the sink receives,
    /// which is empty for FAILED builds.
    pub fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        state: &BuildState,
        status: FinalStatus,
        failure: Option<FailureReason>,
        transitions: Vec<Transition>,
        delivered: &FileSet,
    ) -> Self {
        let outstanding_feedback = match status {
            FinalStatus::SuccessWithWarning => state.feedback().to_vec(),
            _ => Vec::new(),
        };
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            prompt: state.original_prompt().to_string(),
            game_type: state.game_type().ok().map(str::to_string),
            complexity: state.complexity().ok(),
            status,
            iterations: state.iteration_count(),
            failure,
            outstanding_feedback,
            suggestions: state.suggestions().to_vec(),
            transitions,
            files: delivered
                .iter()
                .map(|(name, content)| FileRecord::new(name, content))
                .collect(),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        use anyhow::Context;
        serde_json::to_string_pretty(self).context("Failed to serialize build report")
    }
}
