//! Sequence — child distributions laid end to end on the time axis.
//!
//! Stage `k` is active on `[start_k, start_k + duration_k)`; at an exact
//! boundary the later stage wins, and time 0 belongs to stage 0. The active
//! child sees time relative to its own stage start, so a stage behaves as if
//! it began the run.
//!
//! Past the last stage (`t >= total`), `post_behavior` decides:
//! - `hold_last`: the final child at elapsed time frozen at its own duration
//! - `zero`: no traffic
//! - `repeat`: `t mod total` re-enters the timeline

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::error::DistributionError;
use crate::params::{is_positive, optional_positive, to_float, ParamValues};
use crate::schema::{DistributionMetadata, ParamType, Parameter};

use super::{
    clamp_rate, clamp_time, target_override, ConfigMap, Distribution, DistributionSpec,
    NestedSpec,
};

/// What a sequence does once its timeline is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostBehavior {
    #[default]
    HoldLast,
    Zero,
    Repeat,
}

impl PostBehavior {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hold_last" => Some(Self::HoldLast),
            "zero" => Some(Self::Zero),
            "repeat" => Some(Self::Repeat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HoldLast => "hold_last",
            Self::Zero => "zero",
            Self::Repeat => "repeat",
        }
    }
}

impl fmt::Display for PostBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One time-bounded segment of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub duration_seconds: f64,
    pub spec: DistributionSpec,
    pub target_override: Option<f64>,
}

/// Staged timeline distribution.
#[derive(Default)]
pub struct Sequence {
    pub stages: Vec<Stage>,
    pub post_behavior: PostBehavior,
    pub target_rps: Option<f64>,
    /// Cumulative stage end times.
    ends: Vec<f64>,
    children: Vec<Box<dyn Distribution>>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all stage durations.
    pub fn total_duration(&self) -> f64 {
        self.ends.last().copied().unwrap_or(0.0)
    }

    /// Index of the stage active at `t`, with `0 <= t < total`.
    pub fn stage_index(&self, t: f64) -> usize {
        let idx = self.ends.partition_point(|&end| end <= t);
        idx.min(self.ends.len().saturating_sub(1))
    }

    fn stage_start(&self, idx: usize) -> f64 {
        if idx == 0 {
            0.0
        } else {
            self.ends[idx - 1]
        }
    }

    fn stage_rate(&self, idx: usize, stage_elapsed: f64, target_rps: f64) -> f64 {
        let target = self.stages[idx]
            .target_override
            .or(self.target_rps)
            .unwrap_or(target_rps);
        clamp_rate(self.children[idx].get_rate(stage_elapsed, target))
    }
}

fn parse_stage(index: usize, item: &Value) -> Result<Stage, DistributionError> {
    let field = |name: &str| format!("stages[{index}].{name}");

    let obj = item
        .as_object()
        .ok_or_else(|| DistributionError::config(format!("stages[{index}]"), "must be an object"))?;

    let duration_seconds = match obj.get("duration_seconds") {
        None | Some(Value::Null) => {
            return Err(DistributionError::config(field("duration_seconds"), "is required"))
        }
        Some(raw) => to_float(raw).ok_or_else(|| {
            DistributionError::config(
                field("duration_seconds"),
                format!("expected float, got {raw}"),
            )
        })?,
    };

    let raw_spec = obj
        .get("distribution")
        .ok_or_else(|| DistributionError::config(field("distribution"), "is required"))?;
    let spec = DistributionSpec::from_value(raw_spec).map_err(|(name, reason)| {
        DistributionError::config(format!("stages[{index}].distribution.{name}"), reason)
    })?;

    let target_override = target_override(&spec.config).map_err(|_| {
        DistributionError::config(
            format!("stages[{index}].distribution.config.target_rps"),
            "expected float",
        )
    })?;

    Ok(Stage {
        duration_seconds,
        spec,
        target_override,
    })
}

impl Distribution for Sequence {
    fn metadata(&self) -> DistributionMetadata {
        DistributionMetadata::new(
            "sequence",
            "Sequence distribution - run distributions in order for fixed durations",
        )
        .param(
            "stages",
            Parameter::required(
                ParamType::List,
                "JSON array of {duration_seconds, distribution{name, config}}",
            ),
        )
        .param(
            "post_behavior",
            Parameter::optional(
                ParamType::Str,
                Some(json!("hold_last")),
                "Behavior after stages: hold_last, zero, or repeat",
            ),
        )
        .param(
            "target_rps",
            Parameter::optional(
                ParamType::Float,
                None,
                "Default target RPS for all stages",
            ),
        )
    }

    fn initialize(&mut self, config: &ConfigMap) -> Result<(), DistributionError> {
        let values = ParamValues::decode(&self.metadata(), config)?;

        let raw_behavior = values.str("post_behavior").unwrap_or("hold_last");
        self.post_behavior = PostBehavior::parse(raw_behavior).ok_or_else(|| {
            DistributionError::config(
                "post_behavior",
                format!("must be one of hold_last, zero, repeat; got '{raw_behavior}'"),
            )
        })?;
        self.target_rps = values.float("target_rps");

        self.stages = values
            .list("stages")
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .map(|(i, item)| parse_stage(i, item))
            .collect::<Result<_, _>>()?;

        let mut elapsed = 0.0;
        self.ends = self
            .stages
            .iter()
            .map(|s| {
                elapsed += s.duration_seconds;
                elapsed
            })
            .collect();
        self.children.clear();
        Ok(())
    }

    fn validate(&self) -> bool {
        !self.stages.is_empty()
            && optional_positive(self.target_rps)
            && self
                .stages
                .iter()
                .all(|s| is_positive(s.duration_seconds) && optional_positive(s.target_override))
            && is_positive(self.total_duration())
    }

    fn get_rate(&self, time_elapsed: f64, target_rps: f64) -> f64 {
        let total = self.total_duration();
        if self.children.len() != self.stages.len() || self.children.is_empty() || total <= 0.0 {
            return clamp_rate(target_rps);
        }

        let mut t = clamp_time(time_elapsed);
        if t >= total {
            match self.post_behavior {
                PostBehavior::HoldLast => {
                    let last = self.stages.len() - 1;
                    return self.stage_rate(last, self.stages[last].duration_seconds, target_rps);
                }
                PostBehavior::Zero => return 0.0,
                PostBehavior::Repeat => t %= total,
            }
        }

        let idx = self.stage_index(t);
        self.stage_rate(idx, t - self.stage_start(idx), target_rps)
    }

    fn nested(&self) -> Vec<NestedSpec> {
        self.stages
            .iter()
            .enumerate()
            .map(|(i, s)| NestedSpec {
                path: format!("stages[{i}].distribution"),
                spec: s.spec.clone(),
            })
            .collect()
    }

    fn attach(&mut self, children: Vec<Box<dyn Distribution>>) -> Result<(), DistributionError> {
        if children.len() != self.stages.len() {
            return Err(DistributionError::config(
                "stages",
                format!(
                    "expected {} resolved children, got {}",
                    self.stages.len(),
                    children.len()
                ),
            ));
        }
        self.children = children;
        Ok(())
    }
}
