use anyhow::Result;
use tracing_subscriber::EnvFilter;
use volley_config::domains::logging::{LogFormat, LogLevel};
use volley_config::LoggingConfig;

/// Dependencies that are chatty at debug level; capped at warn
const QUIET_DEPENDENCIES: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Filter directives for `level`, e.g. `info,hyper=warn,...`
pub fn env_filter_directives(level: LogLevel) -> String {
    let mut directives = vec![level.as_str().to_string()];
    if level.is_verbose() {
        directives.extend(QUIET_DEPENDENCIES.iter().map(|dep| format!("{}=warn", dep)));
    }
    directives.join(",")
}

fn build_env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging from configuration
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(&env_filter_directives(config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_ansi(config.ansi);

    // Use try_init to avoid panic if global subscriber already set
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    let env_filter = build_env_filter(log_level);

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_filter_is_plain() {
        assert_eq!(env_filter_directives(LogLevel::Info), "info");
        assert_eq!(env_filter_directives(LogLevel::Error), "error");
    }

    #[test]
    fn test_debug_filter_quiets_http_stack() {
        let directives = env_filter_directives(LogLevel::Debug);
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("hyper=warn"));
        assert!(directives.contains("reqwest=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
