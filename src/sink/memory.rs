use std::sync::Mutex;

use anyhow::Result;

use super::{ArtifactSet, ArtifactSink};

/// Keeps every handoff in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<ArtifactSet>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<ArtifactSet> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<ArtifactSet> {
        self.deliveries().pop()
    }
}

impl ArtifactSink for MemorySink {
    fn deliver(&self, artifacts: &ArtifactSet) -> Result<()> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(artifacts.clone());
        Ok(())
    }
}
