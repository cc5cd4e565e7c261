use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

pub use crate::smith_config::Backend;
use crate::smith_config::{STATE_DIR, SmithToml};

/// Overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend: Option<Backend>,
    pub output_dir: Option<PathBuf>,
    pub no_guide: bool,
    pub verbose: bool,
}

/// Runtime configuration for a build.
///
/// Bridges `gamesmith.toml`, the environment and CLI overrides into the
/// concrete values the generator, agent port and sink need.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub transcript_dir: PathBuf,
    pub output_dir: PathBuf,
    pub backend: Backend,
    pub claude_cmd: String,
    pub model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub generator_timeout: Duration,
    pub schema_retries: u32,
    pub required_files: Vec<String>,
    pub run_guide: bool,
    pub transcripts: bool,
    pub verbose: bool,
    toml: SmithToml,
}

impl Config {
    pub fn new(project_dir: PathBuf, overrides: CliOverrides) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let state_dir = project_dir.join(STATE_DIR);
        let toml = SmithToml::load_or_default(&state_dir)?;
        Self::from_toml(project_dir, toml, overrides)
    }

    /// Resolve a configuration from an already-parsed file.
    pub fn from_toml(project_dir: PathBuf, toml: SmithToml, overrides: CliOverrides) -> Result<Self> {
        let state_dir = project_dir.join(STATE_DIR);
        let log_dir = state_dir.join("logs");
        let transcript_dir = log_dir.join("transcripts");

        let backend = match overrides.backend {
            Some(b) => b,
            None => toml.backend()?,
        };

        let model = toml.generator.model.clone().or_else(|| match backend {
            Backend::Gemini => std::env::var("GEMINI_MODEL").ok(),
            Backend::Claude => None,
        });

        let output_dir = match overrides.output_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => project_dir.join(dir),
            None => project_dir.join(&toml.output.dir),
        };

        Ok(Self {
            state_dir,
            log_dir,
            transcript_dir,
            output_dir,
            backend,
            claude_cmd: toml.claude_cmd(),
            model,
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            temperature: toml.generator.temperature,
            max_output_tokens: toml.generator.max_output_tokens,
            generator_timeout: Duration::from_secs(toml.generator.timeout_secs),
            schema_retries: toml.pipeline.schema_retries,
            required_files: toml.pipeline.required_files.clone(),
            run_guide: toml.pipeline.run_guide && !overrides.no_guide,
            transcripts: toml.output.transcripts,
            verbose: overrides.verbose,
            project_dir,
            toml,
        })
    }

    /// The parsed configuration file this runtime config was built from.
    pub fn toml(&self) -> &SmithToml {
        &self.toml
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.log_dir).context("Failed to create log directory")?;
        if self.transcripts {
            std::fs::create_dir_all(&self.transcript_dir)
                .context("Failed to create transcript directory")?;
        }
        Ok(())
    }

    /// Attempts per agent call: one plus the configured schema retries.
    pub fn max_attempts(&self) -> u32 {
        1 + self.schema_retries
    }

    pub fn relative_to_project<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.project_dir).unwrap_or(path)
    }
}
