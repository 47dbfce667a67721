//! Step function — discrete rate levels switched at time thresholds.
//!
//! The last threshold whose time is `<= t` selects the level. Before the first
//! threshold the rate is `default_rps`; with no thresholds at all the target
//! passes through unchanged.
//!
//! Thresholds are `[time, rate]` pairs (or `{"time", "rate"}` objects), given
//! as a JSON array or a string holding one. The legacy key `steps` is accepted
//! in place of `thresholds`.

use serde_json::{json, Value};

use crate::error::DistributionError;
use crate::params::{is_non_negative, to_float, ParamValues};
use crate::schema::{DistributionMetadata, ParamType, Parameter};

use super::{clamp_rate, clamp_time, ConfigMap, Distribution};

/// Step distribution.
#[derive(Debug, Clone, Default)]
pub struct Step {
    /// `(time, rate)` sorted by time.
    pub thresholds: Vec<(f64, f64)>,
    pub default_rps: f64,
    /// Both `thresholds` and `steps` were supplied.
    ambiguous: bool,
}

impl Step {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: Vec<(f64, f64)>, default_rps: f64) -> Self {
        let mut thresholds = thresholds;
        thresholds.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            thresholds,
            default_rps,
            ambiguous: false,
        }
    }
}

fn parse_threshold(index: usize, item: &Value) -> Result<(f64, f64), DistributionError> {
    let pair = match item {
        Value::Array(pair) if pair.len() == 2 => to_float(&pair[0]).zip(to_float(&pair[1])),
        Value::Object(obj) => obj
            .get("time")
            .and_then(to_float)
            .zip(obj.get("rate").and_then(to_float)),
        _ => None,
    };
    pair.ok_or_else(|| {
        DistributionError::config(
            format!("thresholds[{index}]"),
            format!("must be a [time, rate] pair, got {item}"),
        )
    })
}

impl Distribution for Step {
    fn metadata(&self) -> DistributionMetadata {
        DistributionMetadata::new(
            "step",
            "Step distribution - sudden rate changes at specified times",
        )
        .param(
            "thresholds",
            Parameter::optional(
                ParamType::List,
                None,
                "Array of [time, rps] pairs for step transitions",
            ),
        )
        .param(
            "steps",
            Parameter::optional(ParamType::List, None, "Legacy alias for thresholds"),
        )
        .param(
            "default_rps",
            Parameter::optional(
                ParamType::Float,
                Some(json!(0.0)),
                "Rate to use before first step (default: 0.0)",
            ),
        )
    }

    fn initialize(&mut self, config: &ConfigMap) -> Result<(), DistributionError> {
        let values = ParamValues::decode(&self.metadata(), config)?;
        self.default_rps = values.float_or("default_rps", 0.0);
        self.ambiguous = values.is_set("thresholds") && values.is_set("steps");

        let raw = values
            .list("thresholds")
            .or_else(|| values.list("steps"))
            .unwrap_or(&[]);
        let mut thresholds = raw
            .iter()
            .enumerate()
            .map(|(i, item)| parse_threshold(i, item))
            .collect::<Result<Vec<_>, _>>()?;
        thresholds.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.thresholds = thresholds;
        Ok(())
    }

    fn validate(&self) -> bool {
        if self.ambiguous || !is_non_negative(self.default_rps) {
            return false;
        }
        let mut prev_time = f64::NEG_INFINITY;
        for &(time, rate) in &self.thresholds {
            if !is_non_negative(time) || !is_non_negative(rate) || time <= prev_time {
                return false;
            }
            prev_time = time;
        }
        true
    }

    fn get_rate(&self, time_elapsed: f64, target_rps: f64) -> f64 {
        if self.thresholds.is_empty() {
            return clamp_rate(target_rps);
        }
        let t = clamp_time(time_elapsed);
        let passed = self.thresholds.partition_point(|&(time, _)| time <= t);
        let rate = match passed {
            0 => self.default_rps,
            n => self.thresholds[n - 1].1,
        };
        clamp_rate(rate)
    }
}
