use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use gamesmith::config::Backend;
use gamesmith::orchestrator::FinalStatus;

mod cmd;

#[derive(Parser)]
#[command(name = "gamesmith")]
#[command(version, about = "Turn a game idea into a playable browser game")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a game from a free-text idea
    Build {
        /// The game idea. Prompted for interactively when omitted.
        prompt: Option<String>,

        /// Answer clarification questions from a file, one answer per line
        #[arg(long)]
        answers: Option<PathBuf>,

        /// Where to write the generated game (overrides gamesmith.toml)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Text generation backend: claude or gemini
        #[arg(long)]
        backend: Option<Backend>,

        /// Skip writing the PLAYING.md guide
        #[arg(long)]
        no_guide: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default gamesmith.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let _ = dotenvy::from_path(project_dir.join(".env"));

    match &cli.command {
        Commands::Build {
            prompt,
            answers,
            output_dir,
            backend,
            no_guide,
        } => {
            let status = cmd::cmd_build(
                &cli,
                project_dir,
                cmd::BuildArgs {
                    prompt: prompt.clone(),
                    answers: answers.clone(),
                    output_dir: output_dir.clone(),
                    backend: *backend,
                    no_guide: *no_guide,
                },
            )
            .await?;
            if status == FinalStatus::Failed {
                std::process::exit(1);
            }
        }
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
