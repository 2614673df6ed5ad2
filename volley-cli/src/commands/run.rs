use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use volley_config::{InvocationMode, VolleyConfig};
use volley_core::{Endpoint, RunPlan};
use volley_driver::{CancellationToken, LoadDriver};
use volley_http::{HttpConfig, HttpManager};

use crate::report;
use crate::EXIT_THRESHOLDS_FAILED;

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub preset: Option<String>,
    pub target: Option<String>,
    pub base_url: Option<String>,
    pub function: Option<String>,
    pub invocation: Option<InvocationMode>,
    pub payload_file: Option<PathBuf>,
    pub tag: Option<String>,
    pub summary_export: Option<PathBuf>,
}

impl RunOverrides {
    /// Writes every set override into `config`
    pub fn apply(self, config: &mut VolleyConfig) {
        if let Some(preset) = self.preset {
            config.run.preset = Some(preset);
        }
        if let Some(tag) = self.tag {
            config.run.tag = Some(tag);
        }
        if let Some(path) = self.summary_export {
            config.run.summary_export = Some(path);
        }
        if let Some(target) = self.target {
            config.target.target = Some(target);
        }
        if let Some(base_url) = self.base_url {
            config.target.base_url = base_url;
        }
        if let Some(function) = self.function {
            config.target.function_name = Some(function);
        }
        if let Some(invocation) = self.invocation {
            config.target.invocation = invocation;
        }
        if let Some(payload_file) = self.payload_file {
            config.target.payload_file = Some(payload_file);
        }
    }
}

/// Resolves plan and endpoint from the merged configuration
pub fn prepare_run(mut config: VolleyConfig, overrides: RunOverrides) -> Result<(VolleyConfig, RunPlan, Endpoint)> {
    overrides.apply(&mut config);
    config
        .validate_all()
        .context("Invalid configuration after command-line overrides")?;

    let plan = RunPlan::resolve(&config.run).context("Failed to resolve run plan")?;
    let endpoint = Endpoint::resolve(&config.target).context("Failed to resolve target")?;
    Ok((config, plan, endpoint))
}

/// Handle `volley run`
pub async fn handle_run(config: VolleyConfig, overrides: RunOverrides) -> Result<ExitCode> {
    let (config, plan, endpoint) = prepare_run(config, overrides)?;

    info!(
        "Starting run '{}' against {} ({})",
        plan.tag, endpoint.name, endpoint.url
    );
    info!("Profile: {}", plan.profile.describe());

    let client = HttpManager::with_config(HttpConfig::from(config.http.clone()))
        .context("Failed to build HTTP client")?;
    let driver = LoadDriver::new(plan, endpoint, Arc::new(client)).initialize();

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping run");
            signal_token.cancel();
        }
    });

    let summary = driver.run(cancel).await.context("Load run failed")?;

    println!("{}", report::render_summary(&summary));

    if let Some(path) = config.run.summary_export.as_ref() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        summary
            .export_json(path)
            .with_context(|| format!("Failed to export summary to {:?}", path))?;
        println!("{} Summary written to {:?}", "✓".bright_green().bold(), path);
    }

    if summary.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_THRESHOLDS_FAILED))
    }
}
