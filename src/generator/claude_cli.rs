use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{Prompt, TextGenerator};
use crate::errors::GeneratorError;

/// Runs the `claude` CLI in non-interactive print mode.
///
/// The system prompt is passed with `--system-prompt`, the task goes in via
/// stdin and the plain-text answer is read from stdout.
pub struct ClaudeCli {
    command: String,
    model: Option<String>,
    timeout: Duration,
    working_dir: PathBuf,
}

impl ClaudeCli {
    pub fn new(
        command: String,
        model: Option<String>,
        timeout: Duration,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            command,
            model,
            timeout,
            working_dir,
        }
    }

    /// Command-line arguments for one invocation.
    pub fn args(&self, prompt: &Prompt) -> Vec<String> {
        let mut args = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            "text".to_string(),
            "--system-prompt".to_string(),
            prompt.system.clone(),
        ];
        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args
    }

    async fn run(&self, prompt: &Prompt) -> Result<String, GeneratorError> {
        let mut child = Command::new(&self.command)
            .args(self.args(prompt))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GeneratorError::SpawnFailed {
                command: self.command.clone(),
                source,
            })?;

        debug!(
            pid = child.id().unwrap_or(0),
            chars = prompt.user.len(),
            "Spawned generator process"
        );

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.user.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            return Err(GeneratorError::NonZeroExit {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if stdout.trim().is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }
        Ok(stdout)
    }
}

#[async_trait]
impl TextGenerator for ClaudeCli {
    fn name(&self) -> &str {
        "claude"
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, GeneratorError> {
        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.run(prompt))
            .await
            .map_err(|_| GeneratorError::Timeout(self.timeout))?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Generator process finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(model: Option<&str>) -> ClaudeCli {
        ClaudeCli::new(
            "claude".into(),
            model.map(str::to_string),
            Duration::from_secs(5),
            std::env::temp_dir(),
        )
    }

    #[test]
    fn args_carry_system_prompt() {
        let args = cli(None).args(&Prompt::new("You are the QA Reviewer.", "review"));
        assert_eq!(args[0], "--print");
        let idx = args.iter().position(|a| a == "--system-prompt").unwrap();
        assert_eq!(args[idx + 1], "You are the QA Reviewer.");
        assert!(!args.contains(&"--model".to_string()));
    }

    #[test]
    fn args_include_model_when_set() {
        let args = cli(Some("sonnet")).args(&Prompt::new("s", "u"));
        let idx = args.iter().position(|a| a == "--model").unwrap();
        assert_eq!(args[idx + 1], "sonnet");
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_failure() {
        let generator = ClaudeCli::new(
            "/nonexistent/gamesmith-claude".into(),
            None,
            Duration::from_secs(5),
            std::env::temp_dir(),
        );
        let err = generator.generate(&Prompt::new("s", "u")).await.unwrap_err();
        assert!(matches!(err, GeneratorError::SpawnFailed { .. }));
        assert!(!err.is_transient());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reads_stdout_of_command() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-claude");
        std::fs::write(&script, "#!/bin/sh\ncat\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let generator = ClaudeCli::new(
            script.to_string_lossy().into_owned(),
            None,
            Duration::from_secs(10),
            dir.path().to_path_buf(),
        );
        let out = generator.generate(&Prompt::new("sys", "echo me")).await.unwrap();
        assert_eq!(out, "echo me");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_transient() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("failing-claude");
        std::fs::write(&script, "#!/bin/sh\ncat >/dev/null\necho boom >&2\nexit 3\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let generator = ClaudeCli::new(
            script.to_string_lossy().into_owned(),
            None,
            Duration::from_secs(10),
            dir.path().to_path_buf(),
        );
        match generator.generate(&Prompt::new("s", "u")).await.unwrap_err() {
            GeneratorError::NonZeroExit { exit_code, stderr } => {
                assert_eq!(exit_code, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("Expected NonZeroExit, got {other:?}"),
        }
    }
}
