//! Integration tests for volley-config

use std::io::Write;
use std::time::Duration;
use temp_env::{with_vars, with_vars_unset};
use volley_config::domains::logging::{LogFormat, LogLevel};
use volley_config::*;

/// Run `f` with none of the overridable variables set, serialized with the
/// env-mutating tests
fn without_overrides<F: FnOnce()>(f: F) {
    with_vars_unset(
        vec![
            "VOLLEY_HTTP_TIMEOUT",
            "VOLLEY_LOG_LEVEL",
            "VOLLEY_TARGET",
            "VOLLEY_BASE_URL",
            "VOLLEY_INVOCATION",
            "VOLLEY_PRESET",
        ],
        f,
    )
}

#[test]
fn test_default_config_validation() {
    let config = VolleyConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("VOLLEY_HTTP_TIMEOUT", Some("290")),
        ("VOLLEY_LOG_LEVEL", Some("debug")),
        ("VOLLEY_TARGET", Some("yolov5s")),
        ("VOLLEY_BASE_URL", Some("http://gateway.local:8080")),
        ("VOLLEY_INVOCATION", Some("async")),
        ("VOLLEY_PRESET", Some("burst-spike")),
    ];

    with_vars(vars, || {
        let loader = ConfigLoader::new();
        let config = loader.from_env().unwrap();

        assert_eq!(config.http.timeout, Duration::from_secs(290));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.target.target.as_deref(), Some("yolov5s"));
        assert_eq!(config.target.base_url, "http://gateway.local:8080");
        assert_eq!(config.target.invocation, InvocationMode::Async);
        assert_eq!(config.run.preset.as_deref(), Some("burst-spike"));
    });
}

#[test]
fn test_invalid_env_value_is_rejected() {
    with_vars(vec![("VOLLEY_HTTP_TIMEOUT", Some("soon"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::EnvError { .. }));
        assert!(err.to_string().contains("VOLLEY_HTTP_TIMEOUT"));
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("LOADTEST_PRESET", Some("smoke"))], || {
        let config = ConfigLoader::with_prefix("LOADTEST").from_env().unwrap();
        assert_eq!(config.run.preset.as_deref(), Some("smoke"));
    });
}

#[test]
fn test_yaml_config_serialization() {
    let config = VolleyConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();

    let parsed: VolleyConfig = serde_yaml::from_str(&yaml).unwrap();
    assert!(parsed.validate_all().is_ok());
}

#[test]
fn test_sample_config_loads() {
    without_overrides(|| {
        let sample = VolleyConfig::generate_sample().unwrap();
        assert!(sample.starts_with("# Volley configuration"));
        let config = ConfigLoader::new().from_yaml_str(&sample).unwrap();
        assert_eq!(config.run.preset.as_deref(), Some("smoke"));
        assert_eq!(config.target.target.as_deref(), Some("distilbert"));
    });
}

#[test]
fn test_empty_file_is_defaults() {
    without_overrides(|| {
        let config = ConfigLoader::new().from_yaml_str("   \n").unwrap();
        assert_eq!(config.target.base_url, "http://127.0.0.1:8080");
    });
}

#[test]
fn test_comprehensive_config_file() {
    without_overrides(|| {
        let yaml = r#"
http:
  timeout: 90
  user_agent: "volley-ci"
  verify_ssl: false
  connect_timeout: 5s
  pool:
    max_idle_per_host: 64

logging:
  level: warn
  format: json

target:
  target: distilbert
  base_url: "http://127.0.0.1:8080"
  invocation: sync
  payload_file: "payloads/distilbert_payloads.json"

run:
  tag: nightly-soak
  start_vus: 0
  stages:
    - { duration: 30s, target: 3 }
    - { duration: 1m, target: 3 }
    - { duration: 30s, target: 0 }
  thresholds:
    http_req_failed: ["rate<0.02"]
    checks: ["rate>0.98"]
  think_time: 500ms
  summary_export: "out/summary.json"
"#;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = ConfigLoader::new().from_file(file.path()).unwrap();

        assert_eq!(config.http.timeout, Duration::from_secs(90));
        assert!(!config.http.verify_ssl);
        assert_eq!(config.http.pool.max_idle_per_host, 64);
        assert_eq!(config.http.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.run.tag.as_deref(), Some("nightly-soak"));
        assert_eq!(config.run.stages.as_ref().unwrap().len(), 3);
        assert_eq!(config.run.think_time, Duration::from_millis(500));
        assert_eq!(config.run.thresholds.as_ref().unwrap().len(), 2);
    });
}

#[test]
fn test_invalid_file_reports_domain() {
    without_overrides(|| {
        let yaml = r#"
target:
  base_url: "ftp://gateway"
"#;
        let err = ConfigLoader::new().from_yaml_str(yaml).unwrap_err();
        match err {
            ConfigError::DomainError { domain, .. } => assert_eq!(domain, "target"),
            other => panic!("unexpected error: {other}"),
        }
    });
}

#[test]
fn test_missing_file() {
    let result = ConfigLoader::new().from_file("/definitely/not/here.yaml");
    assert!(matches!(result, Err(ConfigError::FileReadError(_))));
}
