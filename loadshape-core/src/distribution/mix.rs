//! Mix — weighted blend of child distributions.
//!
//! `rate = Σ (w_i / Σw) * child_i.get_rate(t, target_i)`
//!
//! Every component is evaluated on every call; this is a continuous blend,
//! not a random pick per call. `target_i` is the component's own
//! `target_rps` (inside its nested config) if present, else the mix-level
//! `target_rps`, else the caller's target.
//!
//! ```json
//! {"name": "mix", "config": {"components": [
//!     {"weight": 0.7, "distribution": {"name": "constant"}},
//!     {"weight": 0.3, "distribution": {"name": "sine", "config": {"period": 60}}}
//! ]}}
//! ```

use serde_json::Value;

use crate::error::DistributionError;
use crate::params::{is_non_negative, optional_positive, to_float, ParamValues};
use crate::schema::{DistributionMetadata, ParamType, Parameter};

use super::{
    clamp_rate, target_override, ConfigMap, Distribution, DistributionSpec, NestedSpec,
};

/// One weighted entry of a mix.
#[derive(Debug, Clone, PartialEq)]
pub struct MixComponent {
    pub weight: f64,
    pub spec: DistributionSpec,
    /// `target_rps` read from the nested config.
    pub target_override: Option<f64>,
}

/// Weighted blend distribution.
#[derive(Default)]
pub struct Mix {
    pub components: Vec<MixComponent>,
    pub target_rps: Option<f64>,
    children: Vec<Box<dyn Distribution>>,
    normalized_weights: Vec<f64>,
}

impl Mix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized weights, available once children are attached.
    pub fn normalized_weights(&self) -> &[f64] {
        &self.normalized_weights
    }

    fn effective_target(&self, component: &MixComponent, target_rps: f64) -> f64 {
        component
            .target_override
            .or(self.target_rps)
            .unwrap_or(target_rps)
    }
}

fn parse_component(index: usize, item: &Value) -> Result<MixComponent, DistributionError> {
    let field = |name: &str| format!("components[{index}].{name}");

    let obj = item.as_object().ok_or_else(|| {
        DistributionError::config(format!("components[{index}]"), "must be an object")
    })?;

    let weight = match obj.get("weight") {
        None | Some(Value::Null) => {
            return Err(DistributionError::config(field("weight"), "is required"))
        }
        Some(raw) => to_float(raw).ok_or_else(|| {
            DistributionError::config(field("weight"), format!("expected float, got {raw}"))
        })?,
    };

    let raw_spec = obj
        .get("distribution")
        .ok_or_else(|| DistributionError::config(field("distribution"), "is required"))?;
    let spec = DistributionSpec::from_value(raw_spec).map_err(|(name, reason)| {
        DistributionError::config(format!("components[{index}].distribution.{name}"), reason)
    })?;

    let target_override = target_override(&spec.config).map_err(|_| {
        DistributionError::config(
            format!("components[{index}].distribution.config.target_rps"),
            "expected float",
        )
    })?;

    Ok(MixComponent {
        weight,
        spec,
        target_override,
    })
}

impl Distribution for Mix {
    fn metadata(&self) -> DistributionMetadata {
        DistributionMetadata::new(
            "mix",
            "Mix distribution - weighted sum of multiple distributions",
        )
        .param(
            "components",
            Parameter::required(
                ParamType::List,
                "JSON array of {weight, distribution{name, config}}",
            ),
        )
        .param(
            "target_rps",
            Parameter::optional(
                ParamType::Float,
                None,
                "Default target RPS for all components",
            ),
        )
    }

    fn initialize(&mut self, config: &ConfigMap) -> Result<(), DistributionError> {
        let values = ParamValues::decode(&self.metadata(), config)?;
        self.target_rps = values.float("target_rps");
        self.components = values
            .list("components")
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .map(|(i, item)| parse_component(i, item))
            .collect::<Result<_, _>>()?;
        self.children.clear();
        self.normalized_weights.clear();
        Ok(())
    }

    fn validate(&self) -> bool {
        if self.components.is_empty() || !optional_positive(self.target_rps) {
            return false;
        }
        let weights_ok = self.components.iter().all(|c| {
            is_non_negative(c.weight) && optional_positive(c.target_override)
        });
        let total: f64 = self.components.iter().map(|c| c.weight).sum();
        weights_ok && total.is_finite() && total > 0.0
    }

    fn get_rate(&self, time_elapsed: f64, target_rps: f64) -> f64 {
        if self.children.is_empty() {
            return clamp_rate(target_rps);
        }
        let rate = self
            .components
            .iter()
            .zip(&self.children)
            .zip(&self.normalized_weights)
            .filter(|&(_, &w)| w > 0.0)
            .map(|((component, child), w)| {
                w * child.get_rate(time_elapsed, self.effective_target(component, target_rps))
            })
            .sum::<f64>();
        clamp_rate(rate)
    }

    fn nested(&self) -> Vec<NestedSpec> {
        self.components
            .iter()
            .enumerate()
            .map(|(i, c)| NestedSpec {
                path: format!("components[{i}].distribution"),
                spec: c.spec.clone(),
            })
            .collect()
    }

    fn attach(&mut self, children: Vec<Box<dyn Distribution>>) -> Result<(), DistributionError> {
        if children.len() != self.components.len() {
            return Err(DistributionError::config(
                "components",
                format!(
                    "expected {} resolved children, got {}",
                    self.components.len(),
                    children.len()
                ),
            ));
        }
        let total: f64 = self.components.iter().map(|c| c.weight).sum();
        self.normalized_weights = self.components.iter().map(|c| c.weight / total).collect();
        self.children = children;
        Ok(())
    }
}
