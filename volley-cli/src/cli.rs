//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use volley_config::InvocationMode;

#[derive(Parser)]
#[command(name = "volley", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive load against an inference function and report the verdict
    Run {
        /// Named traffic preset (smoke, ramp-up, burst-spike, realistic-soak)
        #[arg(long, value_name = "NAME")]
        preset: Option<String>,

        /// Built-in target (distilbert, logreg, yolov5s)
        #[arg(long, value_name = "NAME")]
        target: Option<String>,

        /// Function gateway base URL
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Deployed function name, overrides the target's
        #[arg(long, value_name = "NAME")]
        function: Option<String>,

        /// Invocation path convention
        #[arg(long, value_enum, value_name = "MODE")]
        invocation: Option<InvocationMode>,

        /// JSON array of request payloads
        #[arg(long, value_name = "PATH")]
        payload_file: Option<PathBuf>,

        /// Label recorded in the summary
        #[arg(long, value_name = "TAG")]
        tag: Option<String>,

        /// Write the end-of-run summary as JSON
        #[arg(long, value_name = "PATH")]
        summary_export: Option<PathBuf>,
    },

    /// Print the stage table and VU targets of a plan without sending traffic
    Plan {
        /// Named traffic preset, overrides the configured one
        #[arg(long, value_name = "NAME")]
        preset: Option<String>,

        /// Sampling step for the VU target table, in seconds
        #[arg(long, value_name = "SECONDS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        step: u64,
    },

    /// List the built-in traffic presets
    Presets,

    /// List the built-in inference targets
    Targets,

    /// Build payload files from raw datasets
    Payloads {
        #[command(subcommand)]
        payloads_cmd: PayloadCommands,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum PayloadCommands {
    /// `{"features": [...]}` per CSV row (header row required)
    FromCsv {
        /// Input CSV file
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Number of leading numeric columns to keep
        #[arg(long, value_name = "COUNT", default_value_t = 8, value_parser = clap::value_parser!(u64).range(1..))]
        features: u64,

        /// Output payload file
        #[arg(long, value_name = "PATH")]
        output: PathBuf,
    },

    /// `{"text": ...}` per non-empty line
    FromText {
        /// Input text file, one sample per line
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Output payload file
        #[arg(long, value_name = "PATH")]
        output: PathBuf,
    },

    /// `{"image": base64}` per image file
    FromImages {
        /// Image files to encode
        #[arg(required = true, value_name = "IMAGE")]
        inputs: Vec<PathBuf>,

        /// Output payload file
        #[arg(long, value_name = "PATH")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Path to configuration file (defaults to environment only)
        #[arg(long, value_name = "PATH")]
        config_file: Option<PathBuf>,

        /// Output format (yaml, json)
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}
