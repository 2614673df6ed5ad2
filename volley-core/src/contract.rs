//! Response contracts and the named checks derived from them

use serde::Serialize;
use serde_json::Value;
use volley_config::{ContractKind, TargetConfig};

/// A rule the JSON response body must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "field", rename_all = "snake_case")]
pub enum FieldRule {
    /// Key is present (any value, `null` included)
    Present(String),
    /// Key is present and holds a JSON array
    Array(String),
}

impl FieldRule {
    fn field(&self) -> &str {
        match self {
            FieldRule::Present(name) | FieldRule::Array(name) => name,
        }
    }

    fn holds(&self, body: &serde_json::Map<String, Value>) -> bool {
        match self {
            FieldRule::Present(name) => body.contains_key(name),
            FieldRule::Array(name) => body.get(name).is_some_and(Value::is_array),
        }
    }
}

/// Expected shape of a successful response
///
/// Produces two independent checks: one on the status code and, when any
/// field rules exist, one on the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseContract {
    pub expected_status: u16,
    pub rules: Vec<FieldRule>,
    status_check: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_check: Option<String>,
}

/// Result of one named check for one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOutcome<'a> {
    pub name: &'a str,
    pub passed: bool,
}

impl ResponseContract {
    fn new(expected_status: u16, rules: Vec<FieldRule>, field_check: Option<String>) -> Self {
        Self {
            expected_status,
            rules,
            status_check: format!("status is {}", expected_status),
            field_check,
        }
    }

    /// Sentiment classifier: `label` and `score`
    pub fn label_score() -> Self {
        Self::new(
            200,
            vec![
                FieldRule::Present("label".to_string()),
                FieldRule::Present("score".to_string()),
            ],
            Some("response contains label and score".to_string()),
        )
    }

    /// Tabular classifier: `prediction`
    pub fn prediction() -> Self {
        Self::new(
            200,
            vec![FieldRule::Present("prediction".to_string())],
            Some("response contains prediction".to_string()),
        )
    }

    /// Object detector: `detections` array
    pub fn detections() -> Self {
        Self::new(
            200,
            vec![FieldRule::Array("detections".to_string())],
            Some("response contains detections".to_string()),
        )
    }

    pub fn status_only() -> Self {
        Self::new(200, Vec::new(), None)
    }

    pub fn custom(fields: &[String], array_fields: &[String]) -> Self {
        let rules: Vec<FieldRule> = fields
            .iter()
            .map(|f| FieldRule::Present(f.clone()))
            .chain(array_fields.iter().map(|f| FieldRule::Array(f.clone())))
            .collect();
        let field_check = if rules.is_empty() {
            None
        } else {
            let names: Vec<&str> = rules.iter().map(FieldRule::field).collect();
            Some(format!("response contains {}", names.join(", ")))
        };
        Self::new(200, rules, field_check)
    }

    /// Builds the contract a target configuration asks for, `default` when unset
    pub fn from_config(config: &TargetConfig, default: ContractKind) -> Self {
        let contract = match config.contract.unwrap_or(default) {
            ContractKind::LabelScore => Self::label_score(),
            ContractKind::Prediction => Self::prediction(),
            ContractKind::Detections => Self::detections(),
            ContractKind::StatusOnly => Self::status_only(),
            ContractKind::Custom => Self::custom(&config.fields, &config.array_fields),
        };
        contract.with_expected_status(config.expected_status)
    }

    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self.status_check = format!("status is {}", status);
        self
    }

    /// Names of every check this contract produces, in reporting order
    pub fn check_names(&self) -> Vec<&str> {
        std::iter::once(self.status_check.as_str())
            .chain(self.field_check.as_deref())
            .collect()
    }

    /// Runs every check against one response
    ///
    /// `status` is `None` when the request failed before a response
    /// arrived, which fails every check.
    pub fn check(&self, status: Option<u16>, body: &[u8]) -> Vec<CheckOutcome<'_>> {
        let mut outcomes = Vec::with_capacity(2);
        outcomes.push(CheckOutcome {
            name: self.status_check.as_str(),
            passed: status == Some(self.expected_status),
        });

        if let Some(name) = self.field_check.as_deref() {
            let passed = status.is_some() && self.body_matches(body);
            outcomes.push(CheckOutcome { name, passed });
        }

        outcomes
    }

    fn body_matches(&self, body: &[u8]) -> bool {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => self.rules.iter().all(|rule| rule.holds(&map)),
            _ => false,
        }
    }
}
