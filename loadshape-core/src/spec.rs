//! Declarative distribution configuration and its fingerprint.
//!
//! - `DistributionSpec`: a strategy name plus its raw configuration, the
//!   shape used at the root of a run and for every nested child.
//! - `SpecHash`: BLAKE3 of the canonical JSON, for logging and reproducibility.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Raw parameter mapping supplied by the caller.
///
/// `serde_json::Map` is key-sorted, so serialization (and hashing) is canonical.
pub type ConfigMap = serde_json::Map<String, Value>;

/// A named distribution with its raw configuration.
///
/// Nested children inside mix components and sequence stages use the same
/// `{ "name": ..., "config": { ... } }` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSpec {
    pub name: String,
    #[serde(default)]
    pub config: ConfigMap,
}

impl DistributionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ConfigMap::new(),
        }
    }

    /// Builder-style config entry.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    /// Parse a nested `{name, config}` object.
    ///
    /// A missing or null `config` is an empty mapping. Errors are returned as
    /// `(field, reason)` relative to the object.
    pub fn from_value(value: &Value) -> Result<Self, (&'static str, String)> {
        let obj = value
            .as_object()
            .ok_or(("distribution", "must be an object".to_string()))?;

        let name = match obj.get("name") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            _ => return Err(("name", "is required".to_string())),
        };

        let config = match obj.get("config") {
            None | Some(Value::Null) => ConfigMap::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(("config", "must be an object".to_string())),
        };

        Ok(Self { name, config })
    }

    /// Structural + parameter hash of this spec (nested children included).
    pub fn fingerprint(&self) -> SpecHash {
        let json = serde_json::to_string(self).unwrap_or_default();
        SpecHash::from_bytes(json.as_bytes())
    }
}

/// Hex-encoded BLAKE3 digest of a canonical spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecHash(pub String);

impl SpecHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex chars, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for SpecHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DistributionSpec {
        DistributionSpec::new("sine")
            .with("period", 60.0)
            .with("amplitude", 0.3)
    }

    #[test]
    fn fingerprint_ignores_insertion_order() {
        let a = sample();
        let b = DistributionSpec::new("sine")
            .with("amplitude", 0.3)
            .with("period", 60.0);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_for_different_params() {
        let a = sample();
        let b = sample().with("period", 120.0);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_for_different_names() {
        let a = DistributionSpec::new("constant");
        let b = DistributionSpec::new("linear");
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn short_hash_is_prefix() {
        let h = sample().fingerprint();
        assert_eq!(h.short().len(), 12);
        assert!(h.0.starts_with(h.short()));
    }

    #[test]
    fn from_value_defaults_missing_config() {
        let spec = DistributionSpec::from_value(&json!({"name": "constant"})).unwrap();
        assert_eq!(spec.name, "constant");
        assert!(spec.config.is_empty());

        let spec = DistributionSpec::from_value(&json!({"name": "constant", "config": null}))
            .unwrap();
        assert!(spec.config.is_empty());
    }

    #[test]
    fn from_value_rejects_bad_shapes() {
        assert_eq!(
            DistributionSpec::from_value(&json!("constant")).unwrap_err().0,
            "distribution"
        );
        assert_eq!(
            DistributionSpec::from_value(&json!({"name": ""})).unwrap_err().0,
            "name"
        );
        assert_eq!(
            DistributionSpec::from_value(&json!({"name": "constant", "config": [1]}))
                .unwrap_err()
                .0,
            "config"
        );
    }

    #[test]
    fn deserializes_without_config_field() {
        let spec: DistributionSpec = serde_json::from_value(json!({"name": "poisson"})).unwrap();
        assert_eq!(spec, DistributionSpec::new("poisson"));
    }
}
