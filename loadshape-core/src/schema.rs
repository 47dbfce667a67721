//! Parameter schema contract — what each distribution accepts.
//!
//! A distribution describes itself with `DistributionMetadata`: identity plus
//! one `Parameter` per configurable value. The schema is pure data; the
//! decoder in `params` consumes it to coerce raw configuration values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Declared type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Int,
    Float,
    Str,
    Bool,
    /// JSON array, or a string holding one.
    List,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::List => "list",
        }
    }

    /// True if `value` is an exact (uncoerced) instance of this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Str => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::List => value.is_array(),
        }
    }
}

/// One configurable value of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// `None` when no default is meaningful (required, or "unset" optionals).
    pub default: Option<Value>,
    pub description: String,
    pub required: bool,
}

impl Parameter {
    pub fn optional(param_type: ParamType, default: Option<Value>, description: &str) -> Self {
        Self {
            param_type,
            default,
            description: description.to_string(),
            required: false,
        }
    }

    pub fn required(param_type: ParamType, description: &str) -> Self {
        Self {
            param_type,
            default: None,
            description: description.to_string(),
            required: true,
        }
    }
}

/// Identity and parameter schema of a distribution.
///
/// `BTreeMap` keeps parameter order deterministic for listings and hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub parameters: BTreeMap<String, Parameter>,
}

impl DistributionMetadata {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            description: description.to_string(),
            author: "loadshape".to_string(),
            parameters: BTreeMap::new(),
        }
    }

    /// Builder-style parameter declaration.
    pub fn param(mut self, name: &str, parameter: Parameter) -> Self {
        self.parameters.insert(name.to_string(), parameter);
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    pub fn declares(&self, parameter: &str) -> bool {
        self.parameters.contains_key(parameter)
    }
}

/// Result of metadata validation.
#[derive(Debug, Clone)]
pub struct SchemaValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check the metadata invariants: non-empty name, and every default matches
/// its declared type. Run at registration time for third-party strategies.
pub fn validate_metadata(metadata: &DistributionMetadata) -> SchemaValidation {
    let mut errors = Vec::new();

    if metadata.name.trim().is_empty() {
        errors.push("metadata name must be non-empty".to_string());
    }

    for (name, parameter) in &metadata.parameters {
        if name.is_empty() {
            errors.push("parameter names must be non-empty".to_string());
            continue;
        }
        match &parameter.default {
            Some(value) if value.is_null() => {}
            Some(value) if !parameter.param_type.accepts(value) => {
                errors.push(format!(
                    "parameter '{}': default {} is not of type {}",
                    name,
                    value,
                    parameter.param_type.as_str()
                ));
            }
            Some(_) if parameter.required => {
                errors.push(format!(
                    "parameter '{}': required parameters must not carry a default",
                    name
                ));
            }
            _ => {}
        }
    }

    SchemaValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
