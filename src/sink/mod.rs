//! Where finished builds go.
//!
//! The orchestrator hands exactly one [`ArtifactSet`] to its sink per run,
//! in every terminal state. FAILED handoffs carry no files.

pub mod directory;
pub mod memory;
pub mod report;

pub use directory::DirectorySink;
pub use memory::MemorySink;
pub use report::{BuildReport, FileRecord};

use anyhow::Result;

use crate::agent::FileSet;
use crate::orchestrator::FinalStatus;

/// The final handoff of a build.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSet {
    pub files: FileSet,
    pub status: FinalStatus,
    /// Player guide, if one was written.
    pub guide: Option<String>,
    pub report: BuildReport,
}

pub trait ArtifactSink: Send + Sync {
    fn deliver(&self, artifacts: &ArtifactSet) -> Result<()>;
}
