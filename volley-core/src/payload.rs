//! The payload set: request bodies virtual users pick from

use crate::error::{CoreResult, PayloadError};
use bytes::Bytes;
use rand::Rng;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

/// One request body, serialized once at load time
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    value: Value,
    body: Bytes,
}

impl Payload {
    pub fn new(value: Value) -> Result<Self, PayloadError> {
        let body = Bytes::from(serde_json::to_vec(&value)?);
        Ok(Self { value, body })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// JSON-encoded request body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Handle to the encoded body; clones share the buffer
    pub fn body_bytes(&self) -> Bytes {
        self.body.clone()
    }
}

/// Immutable, shared collection of payloads
///
/// Cloning is cheap; all clones share the same elements.
#[derive(Debug, Clone, Default)]
pub struct PayloadSet {
    payloads: Arc<[Payload]>,
}

impl PayloadSet {
    pub fn from_values(values: Vec<Value>) -> Result<Self, PayloadError> {
        let payloads = values
            .into_iter()
            .map(Payload::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            payloads: payloads.into(),
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a JSON array of payloads from `path`
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PayloadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| PayloadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let values = match value {
            Value::Array(values) => values,
            other => {
                return Err(PayloadError::NotAnArray {
                    path: path.to_path_buf(),
                    found: json_type(&other),
                }
                .into())
            }
        };

        let set = Self::from_values(values)?;
        debug!("Loaded {} payloads from {}", set.len(), path.display());
        Ok(set)
    }

    /// Like [`PayloadSet::load`], but a failure degrades to an empty set
    ///
    /// The error is logged once here; iterations over an empty set send
    /// nothing.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(set) => set,
            Err(e) => {
                error!(
                    path = %path.display(),
                    "Failed to load payloads, continuing with an empty set: {}", e
                );
                Self::empty()
            }
        }
    }

    /// Uniformly random payload, `None` when the set is empty
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Payload> {
        if self.payloads.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.payloads.len());
        self.payloads.get(index)
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Payload> {
        self.payloads.iter()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::collections::HashSet;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_array() {
        let file = write_temp(r#"[{"text":"great movie"},{"text":"terrible plot"}]"#);
        let set = PayloadSet::load(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next().unwrap().body(), br#"{"text":"great movie"}"#);
    }

    #[test]
    fn test_load_rejects_non_array() {
        let file = write_temp(r#"{"text":"not a list"}"#);
        let err = PayloadSet::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Payload(PayloadError::NotAnArray { found: "an object", .. })
        ));
    }

    #[test]
    fn test_load_or_empty_degrades() {
        let missing = PayloadSet::load_or_empty("/nonexistent/payloads.json");
        assert!(missing.is_empty());

        let broken = write_temp("[{\"text\":");
        assert!(PayloadSet::load_or_empty(broken.path()).is_empty());

        let not_array = write_temp("42");
        assert!(PayloadSet::load_or_empty(not_array.path()).is_empty());
    }

    #[test]
    fn test_choose_from_empty_set() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(PayloadSet::empty().choose(&mut rng).is_none());
    }

    #[test]
    fn test_choose_covers_all_elements() {
        let set = PayloadSet::from_values((0..4).map(|i| json!({ "id": i })).collect()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let seen: HashSet<i64> = (0..200)
            .filter_map(|_| set.choose(&mut rng))
            .filter_map(|p| p.value()["id"].as_i64())
            .collect();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_choose_is_uniform() {
        const DRAWS: usize = 100_000;
        let set = PayloadSet::from_values((0..5).map(|i| json!({ "id": i })).collect()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let mut counts = [0usize; 5];
        for _ in 0..DRAWS {
            let id = set.choose(&mut rng).unwrap().value()["id"].as_u64().unwrap();
            counts[id as usize] += 1;
        }

        // Chi-square with 4 degrees of freedom, p = 0.001
        let expected = DRAWS as f64 / counts.len() as f64;
        let chi2: f64 = counts
            .iter()
            .map(|&observed| (observed as f64 - expected).powi(2) / expected)
            .sum();
        assert!(chi2 < 18.47, "counts {:?} give chi-square {:.2}", counts, chi2);
    }

    #[test]
    fn test_body_bytes_share_buffer() {
        let payload = Payload::new(json!({"image": "aGVsbG8="})).unwrap();
        let first = payload.body_bytes();
        let second = payload.body_bytes();
        assert_eq!(first.as_ptr(), second.as_ptr());
        assert_eq!(first.as_ptr(), payload.body().as_ptr());
    }

    #[test]
    fn test_clones_share_elements() {
        let set = PayloadSet::from_values(vec![json!({"features": [1.0, 2.0]})]).unwrap();
        let clone = set.clone();
        assert!(Arc::ptr_eq(&set.payloads, &clone.payloads));
    }
}
