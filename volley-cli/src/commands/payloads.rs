use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;
use volley_core::generate::{self, Generated};

/// Handle `volley payloads from-csv`
pub fn handle_payloads_from_csv(input: &Path, features: usize, output: &Path) -> Result<()> {
    info!("Generating feature payloads from {:?}", input);
    let file = File::open(input).with_context(|| format!("Failed to open {:?}", input))?;
    let Generated { payloads, skipped } = generate::from_csv(BufReader::new(file), features)
        .with_context(|| format!("Failed to read CSV {:?}", input))?;

    write(output, &payloads)?;
    if skipped > 0 {
        println!("{} Skipped {} malformed rows", "!".yellow().bold(), skipped);
    }
    Ok(())
}

/// Handle `volley payloads from-text`
pub fn handle_payloads_from_text(input: &Path, output: &Path) -> Result<()> {
    info!("Generating text payloads from {:?}", input);
    let file = File::open(input).with_context(|| format!("Failed to open {:?}", input))?;
    let payloads = generate::from_text_lines(BufReader::new(file))
        .with_context(|| format!("Failed to read {:?}", input))?;
    write(output, &payloads)
}

/// Handle `volley payloads from-images`
pub fn handle_payloads_from_images(inputs: &[PathBuf], output: &Path) -> Result<()> {
    info!("Encoding {} images", inputs.len());
    let payloads = generate::from_images(inputs).context("Failed to encode images")?;
    write(output, &payloads)
}

fn write(output: &Path, payloads: &[serde_json::Value]) -> Result<()> {
    generate::write_payloads(output, payloads)
        .with_context(|| format!("Failed to write payloads to {:?}", output))?;
    println!(
        "{} Wrote {} payloads to {:?}",
        "✓".bright_green().bold(),
        payloads.len(),
        output
    );
    Ok(())
}
