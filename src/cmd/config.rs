//! Configuration view and validation commands: `gamesmith config`.

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use gamesmith::config::{CliOverrides, Config};
    use gamesmith::smith_config::{CONFIG_FILE, STATE_DIR, SmithToml, default_config_contents};

    let state_dir = project_dir.join(STATE_DIR);
    let config_path = state_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Gamesmith Configuration");
            println!("=======================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                SmithToml::load(&config_path)?
            } else {
                println!("No {} found at {}", CONFIG_FILE, config_path.display());
                println!("Using default configuration.");
                SmithToml::default()
            };
            println!();

            println!("[generator]");
            println!("  backend = \"{}\"", toml.generator.backend);
            if let Some(cmd) = &toml.generator.claude_cmd {
                println!("  claude_cmd = \"{}\"", cmd);
            }
            if let Some(model) = &toml.generator.model {
                println!("  model = \"{}\"", model);
            }
            println!("  temperature = {}", toml.generator.temperature);
            println!("  max_output_tokens = {}", toml.generator.max_output_tokens);
            println!("  timeout_secs = {}", toml.generator.timeout_secs);
            println!();

            println!("[pipeline]");
            println!("  schema_retries = {}", toml.pipeline.schema_retries);
            println!("  required_files = {:?}", toml.pipeline.required_files);
            println!("  run_guide = {}", toml.pipeline.run_guide);
            println!();

            println!("[output]");
            println!("  dir = \"{}\"", toml.output.dir);
            println!("  transcripts = {}", toml.output.transcripts);
            println!();

            println!("Effective values (with env overrides):");
            let config = Config::new(project_dir.to_path_buf(), CliOverrides::default())?;
            println!("  backend = \"{}\"", config.backend);
            println!("  claude_cmd = \"{}\"", config.claude_cmd);
            if let Some(model) = &config.model {
                println!("  model = \"{}\"", model);
            }
            println!(
                "  gemini_api_key = {}",
                if config.gemini_api_key.is_some() {
                    "set"
                } else {
                    "not set"
                }
            );
            println!(
                "  output_dir = {}",
                config.relative_to_project(&config.output_dir).display()
            );
            println!();

            if !config_path.exists() {
                println!("Run 'gamesmith config init' to create a {} file.", CONFIG_FILE);
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE);
                return Ok(());
            }

            let toml = SmithToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&state_dir)?;
            std::fs::write(&config_path, default_config_contents()?)?;

            println!("Created {} at {}", CONFIG_FILE, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [generator] backend, claude_cmd, model, timeout_secs");
            println!("  - [pipeline] schema_retries, required_files, run_guide");
            println!("  - [output] dir, transcripts");
            println!();
        }
    }

    Ok(())
}
