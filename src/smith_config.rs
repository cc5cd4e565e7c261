//! Project configuration file for gamesmith.
//!
//! Settings live in `.gamesmith/gamesmith.toml`. Every field has a default,
//! so a missing file or an empty one is valid. Values are layered
//! file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [generator]
//! backend = "claude"          # or "gemini"
//! claude_cmd = "claude"
//! model = "gemini-2.5-pro"
//! temperature = 0.3
//! max_output_tokens = 8192
//! timeout_secs = 600
//!
//! [pipeline]
//! schema_retries = 2
//! required_files = ["index.html", "style.css", "game.js"]
//! run_guide = true
//!
//! [output]
//! dir = "generated_game"
//! transcripts = true
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::agent::schema::is_plain_file_name;

/// Name of the per-project state directory.
pub const STATE_DIR: &str = ".gamesmith";
/// Name of the configuration file inside [`STATE_DIR`].
pub const CONFIG_FILE: &str = "gamesmith.toml";

/// Which text generation backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The `claude` CLI in print mode (default)
    #[default]
    Claude,
    /// Google's Gemini HTTP API
    Gemini,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Claude => write!(f, "claude"),
            Backend::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(Backend::Claude),
            "gemini" => Ok(Backend::Gemini),
            _ => anyhow::bail!("Invalid backend '{}'. Valid values: claude, gemini", s),
        }
    }
}

/// `[generator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSection {
    #[serde(default)]
    pub backend: Backend,
    /// Claude CLI command (falls back to `CLAUDE_CMD`, then "claude")
    #[serde(default)]
    pub claude_cmd: Option<String>,
    /// Model override passed to the backend
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Upper bound on a single generator call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            claude_cmd: None,
            model: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Extra attempts per agent call after malformed output
    #[serde(default = "default_schema_retries")]
    pub schema_retries: u32,
    /// Files every generated game must contain
    #[serde(default = "default_required_files")]
    pub required_files: Vec<String>,
    /// Ask for a player guide after a successful build
    #[serde(default = "default_true")]
    pub run_guide: bool,
}

fn default_schema_retries() -> u32 {
    2
}

pub fn default_required_files() -> Vec<String> {
    vec![
        "index.html".to_string(),
        "style.css".to_string(),
        "game.js".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            schema_retries: default_schema_retries(),
            required_files: default_required_files(),
            run_guide: true,
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// Output directory, relative to the project directory
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Keep prompt/output transcripts under `.gamesmith/logs/transcripts`
    #[serde(default = "default_true")]
    pub transcripts: bool,
}

fn default_output_dir() -> String {
    "generated_game".to_string()
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            transcripts: true,
        }
    }
}

/// The complete gamesmith.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmithToml {
    #[serde(default)]
    pub generator: GeneratorSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub output: OutputSection,
}

impl SmithToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse gamesmith.toml")
    }

    /// Load `gamesmith.toml` from `state_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize gamesmith.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Claude command (file → `CLAUDE_CMD` → "claude").
    pub fn claude_cmd(&self) -> String {
        self.generator
            .claude_cmd
            .clone()
            .or_else(|| std::env::var("CLAUDE_CMD").ok())
            .unwrap_or_else(|| "claude".to_string())
    }

    /// Backend (`GAMESMITH_BACKEND` overrides the file).
    pub fn backend(&self) -> Result<Backend> {
        match std::env::var("GAMESMITH_BACKEND") {
            Ok(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(self.generator.backend),
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.generator.timeout_secs == 0 {
            warnings.push("timeout_secs is 0: every generator call would time out".to_string());
        }
        if !(0.0..=2.0).contains(&self.generator.temperature) {
            warnings.push(format!(
                "temperature {} is outside the supported range 0.0-2.0",
                self.generator.temperature
            ));
        }
        if self.pipeline.schema_retries > 5 {
            warnings.push(format!(
                "schema_retries {} is high: a bad model response will be retried {} times",
                self.pipeline.schema_retries, self.pipeline.schema_retries
            ));
        }
        if self.pipeline.required_files.is_empty() {
            warnings.push("required_files is empty: any non-empty file set will be accepted".to_string());
        }
        for name in &self.pipeline.required_files {
            if !is_plain_file_name(name) {
                warnings.push(format!(
                    "required file '{}' is not a plain file name and can never be produced",
                    name
                ));
            }
        }
        if self.output.dir.trim().is_empty() {
            warnings.push("output dir is empty: files would be written to the project root".to_string());
        }
        if self.generator.backend == Backend::Gemini && std::env::var("GEMINI_API_KEY").is_err() {
            warnings.push("backend is gemini but GEMINI_API_KEY is not set".to_string());
        }

        warnings
    }
}

/// Default file written by `gamesmith config init`.
pub fn default_config_contents() -> Result<String> {
    toml::to_string_pretty(&SmithToml::default()).context("Failed to serialize default config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_empty_file_uses_defaults() {
        let toml = SmithToml::parse("").unwrap();
        assert_eq!(toml.generator.backend, Backend::Claude);
        assert_eq!(toml.generator.max_output_tokens, 8192);
        assert_eq!(toml.pipeline.schema_retries, 2);
        assert_eq!(
            toml.pipeline.required_files,
            vec!["index.html", "style.css", "game.js"]
        );
        assert!(toml.pipeline.run_guide);
        assert_eq!(toml.output.dir, "generated_game");
    }

    #[test]
    fn test_partial_sections() {
        let content = r#"
[generator]
backend = "gemini"
model = "gemini-2.0-flash"

[pipeline]
run_guide = false
"#;
        let toml = SmithToml::parse(content).unwrap();
        assert_eq!(toml.generator.backend, Backend::Gemini);
        assert_eq!(toml.generator.model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(toml.generator.temperature, 0.3);
        assert!(!toml.pipeline.run_guide);
        assert_eq!(toml.pipeline.schema_retries, 2);
    }

    #[test]
    fn test_invalid_backend_is_parse_error() {
        let result = SmithToml::parse("[generator]\nbackend = \"openai\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Gemini".parse::<Backend>().unwrap(), Backend::Gemini);
        let err = "gpt".parse::<Backend>().unwrap_err();
        assert!(err.to_string().contains("Valid values"));
    }

    #[test]
    fn test_claude_cmd_priority() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var("CLAUDE_CMD").ok();
        unsafe { std::env::remove_var("CLAUDE_CMD") };

        assert_eq!(SmithToml::default().claude_cmd(), "claude");

        unsafe { std::env::set_var("CLAUDE_CMD", "env-claude") };
        assert_eq!(SmithToml::default().claude_cmd(), "env-claude");

        let toml = SmithToml::parse("[generator]\nclaude_cmd = \"file-claude\"\n").unwrap();
        assert_eq!(toml.claude_cmd(), "file-claude");

        unsafe { std::env::remove_var("CLAUDE_CMD") };
        if let Some(val) = saved {
            unsafe { std::env::set_var("CLAUDE_CMD", val) };
        }
    }

    #[test]
    fn test_backend_env_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var("GAMESMITH_BACKEND").ok();

        unsafe { std::env::set_var("GAMESMITH_BACKEND", "gemini") };
        assert_eq!(SmithToml::default().backend().unwrap(), Backend::Gemini);

        unsafe { std::env::remove_var("GAMESMITH_BACKEND") };
        assert_eq!(SmithToml::default().backend().unwrap(), Backend::Claude);

        if let Some(val) = saved {
            unsafe { std::env::set_var("GAMESMITH_BACKEND", val) };
        }
    }

    #[test]
    fn test_validate_defaults_is_clean() {
        assert!(SmithToml::default().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_problems() {
        let content = r#"
[generator]
timeout_secs = 0

[pipeline]
schema_retries = 9
required_files = ["index.html", "js/game.js"]
"#;
        let warnings = SmithToml::parse(content).unwrap().validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("timeout_secs")));
        assert!(warnings.iter().any(|w| w.contains("schema_retries")));
        assert!(warnings.iter().any(|w| w.contains("js/game.js")));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut toml = SmithToml::default();
        toml.output.dir = "out".into();
        toml.save(&path).unwrap();

        let loaded = SmithToml::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded.output.dir, "out");
    }

    #[test]
    fn test_default_config_contents_parse() {
        let contents = default_config_contents().unwrap();
        assert!(contents.contains("[generator]"));
        assert!(SmithToml::parse(&contents).is_ok());
    }
}
