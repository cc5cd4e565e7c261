//! Game building: `gamesmith build`.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::sync::Arc;

use gamesmith::config::Backend;
use gamesmith::orchestrator::FinalStatus;

use super::super::Cli;

pub struct BuildArgs {
    pub prompt: Option<String>,
    pub answers: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub no_guide: bool,
}

/// Read the game idea interactively.
fn ask_for_prompt() -> Result<String> {
    use dialoguer::{Input, theme::ColorfulTheme};

    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Describe the game you want to build")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read game idea")
}

pub async fn cmd_build(cli: &Cli, project_dir: PathBuf, args: BuildArgs) -> Result<FinalStatus> {
    use gamesmith::agent::{GenerativeAgentPort, TranscriptLog};
    use gamesmith::config::{CliOverrides, Config};
    use gamesmith::gates::{AnswerSource, ScriptedAnswers, TerminalAnswers};
    use gamesmith::generator;
    use gamesmith::orchestrator::{Orchestrator, OrchestratorOptions};
    use gamesmith::sink::DirectorySink;
    use gamesmith::ui::BuildUI;

    let prompt = match args.prompt {
        Some(p) => p,
        None => ask_for_prompt()?,
    };
    let prompt = prompt.trim().to_string();
    if prompt.is_empty() {
        bail!("Game idea must not be empty");
    }

    let config = Config::new(
        project_dir,
        CliOverrides {
            backend: args.backend,
            output_dir: args.output_dir,
            no_guide: args.no_guide,
            verbose: cli.verbose,
        },
    )?;
    config.ensure_directories()?;
    let _log_guard = gamesmith::logging::init(&config.log_dir, config.verbose)?;

    for warning in config.toml().validate() {
        tracing::warn!("{}", warning);
    }

    let generator = generator::from_config(&config).context("Failed to set up text generator")?;
    tracing::info!(
        backend = %config.backend,
        generator = generator.name(),
        attempts = config.max_attempts(),
        "Generator ready"
    );
    let mut port = GenerativeAgentPort::new(generator, config.max_attempts());
    if config.transcripts {
        port = port.with_transcripts(TranscriptLog::new(&config.transcript_dir)?);
    }

    let mut answers: Box<dyn AnswerSource> = match &args.answers {
        Some(path) => Box::new(ScriptedAnswers::from_file(path)?),
        None => Box::new(TerminalAnswers),
    };

    let ui = Arc::new(BuildUI::new(config.verbose));
    let orchestrator = Orchestrator::new(
        Arc::new(port),
        Arc::new(DirectorySink::new(&config.output_dir)),
        OrchestratorOptions::from_config(&config),
    )
    .with_ui(ui.clone());

    let outcome = orchestrator.run(&prompt, answers.as_mut()).await?;

    if let Some(reason) = &outcome.failure {
        ui.warn(&format!("Build failed: {}", reason));
    }
    if let Some(degraded) = &outcome.degraded {
        ui.warn(&format!(
            "Validation still failing after {} iterations. Outstanding issues:",
            degraded.iterations
        ));
        for item in &degraded.outstanding_feedback {
            ui.warn(&format!("  - {}", item));
        }
    }
    ui.print_result(
        outcome.status,
        outcome.state.iteration_count(),
        Some(config.relative_to_project(&config.output_dir)),
        &outcome.delivered_files(),
    );

    Ok(outcome.status)
}
