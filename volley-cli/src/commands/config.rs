use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use volley_config::VolleyConfig;

use crate::load_config;

/// Handle configuration validation
pub fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match load_config(Some(config_file)) {
        Ok(_config) => {
            println!("{} Configuration file is valid", "✓".bright_green().bold());
            Ok(())
        }
        Err(e) => {
            println!(
                "{} Configuration validation failed: {:#}",
                "✗".bright_red().bold(),
                e
            );
            error!("Configuration validation failed: {:#}", e);
            Err(e)
        }
    }
}

/// Handle configuration generation
pub fn handle_config_generate(output: &Path, force: bool) -> Result<()> {
    info!("Generating configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    let sample = VolleyConfig::generate_sample().context("Failed to render sample configuration")?;
    fs::write(output, sample).context("Failed to write configuration file")?;

    println!(
        "{} Configuration generated at: {:?}",
        "✓".bright_green().bold(),
        output
    );
    println!(
        "Validate with: volley config validate --config-file {:?}",
        output
    );
    Ok(())
}

/// Handle configuration display
pub fn handle_config_show(config_file: Option<&PathBuf>, format: &str) -> Result<()> {
    let config = load_config(config_file)?;
    println!("{}", render_config(&config, format)?);
    Ok(())
}

pub fn render_config(config: &VolleyConfig, format: &str) -> Result<String> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(config).context("Failed to serialize to YAML"),
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize to JSON"),
        _ => Err(anyhow::anyhow!(
            "Unknown output format: {}. Valid formats: yaml, json",
            format
        )),
    }
}
