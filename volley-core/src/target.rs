//! Built-in inference targets and endpoint resolution

use crate::contract::ResponseContract;
use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use volley_config::{ContractKind, InvocationMode, TargetConfig};

/// A known inference function and the files that go with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinTarget {
    pub name: &'static str,
    pub function_name: &'static str,
    pub payload_file: &'static str,
    pub contract: ContractKind,
    pub description: &'static str,
}

pub const BUILTIN_TARGETS: &[BuiltinTarget] = &[
    BuiltinTarget {
        name: "distilbert",
        function_name: "distilbert-finetuned-inference",
        payload_file: "payloads/distilbert_payloads.json",
        contract: ContractKind::LabelScore,
        description: "Sentiment classifier, {\"text\": ...} in, label and score out",
    },
    BuiltinTarget {
        name: "logreg",
        function_name: "logreg-inference",
        payload_file: "payloads/logreg-payloads.json",
        contract: ContractKind::Prediction,
        description: "Logistic regression, {\"features\": [...]} in, prediction out",
    },
    BuiltinTarget {
        name: "yolov5s",
        function_name: "yolov5s-inference",
        payload_file: "payloads/base64_payload.json",
        contract: ContractKind::Detections,
        description: "Object detector, {\"image\": base64} in, detections array out",
    },
];

impl BuiltinTarget {
    pub fn find(name: &str) -> Option<&'static BuiltinTarget> {
        BUILTIN_TARGETS
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Fully resolved endpoint a run sends requests to
#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
    pub invocation: InvocationMode,
    pub contract: ResponseContract,
    pub payload_file: PathBuf,
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<Duration>,
}

impl Endpoint {
    /// Resolves a target configuration, explicit fields overriding the catalog entry
    pub fn resolve(config: &TargetConfig) -> CoreResult<Self> {
        let builtin = match config.target.as_deref() {
            Some(name) => Some(
                BuiltinTarget::find(name).ok_or_else(|| CoreError::UnknownTarget(name.to_string()))?,
            ),
            None => None,
        };

        let function_name = config
            .function_name
            .clone()
            .or_else(|| builtin.map(|t| t.function_name.to_string()))
            .ok_or_else(|| {
                CoreError::Target("either target or function_name must be set".to_string())
            })?;

        let payload_file = config
            .payload_file
            .clone()
            .or_else(|| builtin.map(|t| PathBuf::from(t.payload_file)))
            .ok_or_else(|| {
                CoreError::Target(format!("payload_file is required for '{}'", function_name))
            })?;

        let default_contract = builtin.map_or(ContractKind::StatusOnly, |t| t.contract);
        let contract = ResponseContract::from_config(config, default_contract);

        Ok(Self {
            name: builtin.map_or_else(|| function_name.clone(), |t| t.name.to_string()),
            url: function_url(&config.base_url, config.invocation, &function_name),
            invocation: config.invocation,
            contract,
            payload_file,
            request_timeout: config.request_timeout,
        })
    }
}

/// `{base_url}/{function|async-function}/{name}`
pub fn function_url(base_url: &str, invocation: InvocationMode, function_name: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        invocation.path_prefix(),
        function_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(name: &str) -> TargetConfig {
        TargetConfig {
            target: Some(name.to_string()),
            ..TargetConfig::default()
        }
    }

    #[test]
    fn test_builtin_catalog() {
        let distilbert = BuiltinTarget::find("distilbert").unwrap();
        assert_eq!(distilbert.function_name, "distilbert-finetuned-inference");
        assert_eq!(distilbert.contract, ContractKind::LabelScore);
        assert!(BuiltinTarget::find("LogReg").is_some());
        assert!(BuiltinTarget::find("resnet").is_none());
    }

    #[test]
    fn test_resolve_builtin_target() {
        let endpoint = Endpoint::resolve(&target("yolov5s")).unwrap();
        assert_eq!(endpoint.name, "yolov5s");
        assert_eq!(endpoint.url, "http://127.0.0.1:8080/function/yolov5s-inference");
        assert_eq!(endpoint.payload_file, PathBuf::from("payloads/base64_payload.json"));
        assert_eq!(
            endpoint.contract.check_names(),
            vec!["status is 200", "response contains detections"]
        );
    }

    #[test]
    fn test_explicit_fields_override_catalog() {
        let config = TargetConfig {
            base_url: "http://gateway.local:31112/".to_string(),
            invocation: InvocationMode::Async,
            payload_file: Some(PathBuf::from("/data/texts.json")),
            contract: Some(ContractKind::StatusOnly),
            expected_status: 202,
            ..target("distilbert")
        };
        let endpoint = Endpoint::resolve(&config).unwrap();
        assert_eq!(
            endpoint.url,
            "http://gateway.local:31112/async-function/distilbert-finetuned-inference"
        );
        assert_eq!(endpoint.payload_file, PathBuf::from("/data/texts.json"));
        assert_eq!(endpoint.contract.check_names(), vec!["status is 202"]);
    }

    #[test]
    fn test_custom_function_without_catalog() {
        let config = TargetConfig {
            function_name: Some("resnet-inference".to_string()),
            payload_file: Some(PathBuf::from("payloads/resnet.json")),
            ..TargetConfig::default()
        };
        let endpoint = Endpoint::resolve(&config).unwrap();
        assert_eq!(endpoint.name, "resnet-inference");
        assert_eq!(endpoint.contract.check_names(), vec!["status is 200"]);
    }

    #[test]
    fn test_resolve_errors() {
        assert!(matches!(
            Endpoint::resolve(&target("resnet")),
            Err(CoreError::UnknownTarget(_))
        ));
        assert!(matches!(
            Endpoint::resolve(&TargetConfig::default()),
            Err(CoreError::Target(_))
        ));
        let no_payloads = TargetConfig {
            function_name: Some("echo".to_string()),
            ..TargetConfig::default()
        };
        assert!(matches!(Endpoint::resolve(&no_payloads), Err(CoreError::Target(_))));
    }

    #[test]
    fn test_function_url_trims_trailing_slash() {
        assert_eq!(
            function_url("http://localhost:8080///", InvocationMode::Sync, "logreg-inference"),
            "http://localhost:8080/function/logreg-inference"
        );
    }
}
