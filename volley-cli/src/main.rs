use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{debug, error, info};
use volley_config::domains::logging::LogLevel;
use volley_config::{ConfigLoader, LoggingConfig, VolleyConfig};

mod cli;
mod commands;
mod report;

use cli::{Cli, Commands, ConfigCommands, PayloadCommands};
use commands::RunOverrides;

/// Exit code when the run finished but thresholds failed
pub const EXIT_THRESHOLDS_FAILED: u8 = 99;

/// Load configuration from file, or from `VOLLEY_*` variables alone
pub(crate) fn load_config(config_path: Option<&PathBuf>) -> Result<VolleyConfig> {
    let loader = ConfigLoader::new();
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            loader
                .from_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))
        }
        None => {
            debug!("No config file specified, using defaults and environment");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

/// Initialize logging from configuration, `--log-level` overriding the configured level
fn init_logging_with_config(config: &LoggingConfig, log_level: Option<&str>) -> Result<()> {
    let mut logging_config = config.clone();
    if let Some(level_str) = log_level {
        match LogLevel::from_str(level_str) {
            Ok(level) => logging_config.level = level,
            Err(_) => eprintln!(
                "Invalid log level '{}', keeping '{}'",
                level_str, logging_config.level
            ),
        }
    }

    volley_logging::init_logging_from_config(&logging_config)
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            volley_logging::init_simple_tracing(cli.log_level.as_deref().unwrap_or("info"))?;
            return Err(e);
        }
    };

    init_logging_with_config(&config.logging, cli.log_level.as_deref())?;
    debug!("Volley CLI starting");

    let command = match cli.command {
        Some(command) => command,
        None => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            return Ok(ExitCode::SUCCESS);
        }
    };

    match command {
        Commands::Run {
            preset,
            target,
            base_url,
            function,
            invocation,
            payload_file,
            tag,
            summary_export,
        } => {
            let overrides = RunOverrides {
                preset,
                target,
                base_url,
                function,
                invocation,
                payload_file,
                tag,
                summary_export,
            };
            commands::handle_run(config, overrides).await
        }
        Commands::Plan { preset, step } => {
            commands::handle_plan(config, preset, step)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Presets => {
            commands::handle_presets();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Targets => {
            commands::handle_targets();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Payloads { payloads_cmd } => {
            match payloads_cmd {
                PayloadCommands::FromCsv {
                    input,
                    features,
                    output,
                } => commands::handle_payloads_from_csv(&input, features as usize, &output)?,
                PayloadCommands::FromText { input, output } => {
                    commands::handle_payloads_from_text(&input, &output)?
                }
                PayloadCommands::FromImages { inputs, output } => {
                    commands::handle_payloads_from_images(&inputs, &output)?
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { config_cmd } => {
            match config_cmd {
                ConfigCommands::Validate { config_file } => {
                    commands::handle_config_validate(&config_file)?
                }
                ConfigCommands::Generate { output, force } => {
                    commands::handle_config_generate(&output, force)?
                }
                ConfigCommands::Show {
                    config_file,
                    format,
                } => commands::handle_config_show(config_file.as_ref(), &format)?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "✗".bright_red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
