//! Schema-driven decoder — raw configuration values to typed parameters.
//!
//! `ParamValues::decode` walks a distribution's declared parameters, coerces
//! each supplied value to its declared type, and fills in defaults. Coercion
//! follows the lenient wire format the control plane sends: numeric strings
//! are accepted for numbers, JSON strings for lists. Booleans are never
//! accepted as numbers.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::distribution::ConfigMap;
use crate::error::DistributionError;
use crate::schema::{DistributionMetadata, ParamType};

/// A decoded parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    /// Integer above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Vec<Value>),
}

/// Decoded parameters of one distribution config.
#[derive(Debug, Clone, Default)]
pub struct ParamValues {
    values: BTreeMap<String, ParamValue>,
    /// Names supplied by the caller (as opposed to filled from defaults).
    explicit: Vec<String>,
}

impl ParamValues {
    /// Decode `config` against `metadata`.
    ///
    /// Fails with `Configuration` naming the parameter when a required value
    /// is missing or a supplied value cannot be coerced. Keys not declared in
    /// the schema are ignored.
    pub fn decode(
        metadata: &DistributionMetadata,
        config: &ConfigMap,
    ) -> Result<Self, DistributionError> {
        let mut decoded = Self::default();

        for (name, parameter) in &metadata.parameters {
            match config.get(name).filter(|v| !v.is_null()) {
                Some(raw) => {
                    let value = coerce(raw, parameter.param_type).ok_or_else(|| {
                        DistributionError::config(
                            name.as_str(),
                            format!("expected {}, got {}", parameter.param_type.as_str(), raw),
                        )
                    })?;
                    decoded.values.insert(name.clone(), value);
                    decoded.explicit.push(name.clone());
                }
                None if parameter.required => {
                    return Err(DistributionError::config(name.as_str(), "is required"));
                }
                None => {
                    if let Some(value) = parameter
                        .default
                        .as_ref()
                        .and_then(|d| coerce(d, parameter.param_type))
                    {
                        decoded.values.insert(name.clone(), value);
                    }
                }
            }
        }

        for key in config.keys() {
            if !metadata.declares(key) {
                tracing::debug!(
                    distribution = %metadata.name,
                    key = %key,
                    "ignoring undeclared config key"
                );
            }
        }

        Ok(decoded)
    }

    /// True if the caller supplied `name` (defaults do not count).
    pub fn is_set(&self, name: &str) -> bool {
        self.explicit.iter().any(|n| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Float value; ints widen.
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.values.get(name)? {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn float_or(&self, name: &str, default: f64) -> f64 {
        self.float(name).unwrap_or(default)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name)? {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Non-negative integer; `None` for negatives.
    pub fn uint(&self, name: &str) -> Option<u64> {
        match self.values.get(name)? {
            ParamValue::Int(v) => u64::try_from(*v).ok(),
            ParamValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        match self.values.get(name) {
            Some(ParamValue::Bool(v)) => *v,
            _ => default,
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            ParamValue::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&[Value]> {
        match self.values.get(name)? {
            ParamValue::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

/// Coerce a raw JSON value to `param_type`. `None` if it cannot be coerced.
pub fn coerce(raw: &Value, param_type: ParamType) -> Option<ParamValue> {
    match param_type {
        ParamType::Float => to_float(raw).map(ParamValue::Float),
        ParamType::Int => to_int(raw)
            .map(ParamValue::Int)
            .or_else(|| to_uint(raw).map(ParamValue::UInt)),
        ParamType::Bool => match raw {
            Value::Bool(b) => Some(ParamValue::Bool(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(ParamValue::Bool(true)),
                "false" => Some(ParamValue::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        ParamType::Str => raw.as_str().map(|s| ParamValue::Str(s.to_string())),
        ParamType::List => parse_list(raw).map(ParamValue::List),
    }
}

/// Lenient float conversion: numbers and numeric strings. Bools are rejected.
pub fn to_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn to_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn to_uint(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// A JSON array as-is, or a string holding a JSON array.
pub fn parse_list(raw: &Value) -> Option<Vec<Value>> {
    match raw {
        Value::Array(items) => Some(items.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Finite and strictly positive.
pub fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Finite and zero or above.
pub fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Optional values pass when unset.
pub fn optional_positive(value: Option<f64>) -> bool {
    value.map_or(true, is_positive)
}
