//! Sine wave — periodic modulation around a base rate.
//!
//! `rate = base * (1 + amplitude * sin(2π (t + phase_shift) / period))`,
//! clamped at zero. `base` is `base_rps` when set, else the caller's target.
//!
//! With period 3600 and amplitude 0.5 the rate is `base` at t=0, `1.5 * base`
//! at t=900, `base` at t=1800 and `0.5 * base` at t=2700.

use std::f64::consts::PI;

use serde_json::json;

use crate::error::DistributionError;
use crate::params::{is_non_negative, is_positive, optional_positive, ParamValues};
use crate::schema::{DistributionMetadata, ParamType, Parameter};

use super::{clamp_rate, clamp_time, ConfigMap, Distribution};

/// Sine wave distribution.
#[derive(Debug, Clone)]
pub struct Sine {
    pub period: f64,
    pub amplitude: f64,
    pub phase_shift: f64,
    pub base_rps: Option<f64>,
}

impl Default for Sine {
    fn default() -> Self {
        Self {
            period: 3600.0,
            amplitude: 0.5,
            phase_shift: 0.0,
            base_rps: None,
        }
    }
}

impl Sine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Distribution for Sine {
    fn metadata(&self) -> DistributionMetadata {
        DistributionMetadata::new(
            "sine",
            "Sine wave distribution - periodic rate modulation following sine pattern",
        )
        .param(
            "period",
            Parameter::optional(
                ParamType::Float,
                Some(json!(3600.0)),
                "Period in seconds (default 1 hour)",
            ),
        )
        .param(
            "amplitude",
            Parameter::optional(
                ParamType::Float,
                Some(json!(0.5)),
                "Amplitude as fraction of target RPS (0-1)",
            ),
        )
        .param(
            "phase_shift",
            Parameter::optional(ParamType::Float, Some(json!(0.0)), "Phase shift in seconds"),
        )
        .param(
            "base_rps",
            Parameter::optional(
                ParamType::Float,
                None,
                "Base rate (uses target_rps if not set)",
            ),
        )
    }

    fn initialize(&mut self, config: &ConfigMap) -> Result<(), DistributionError> {
        let values = ParamValues::decode(&self.metadata(), config)?;
        self.period = values.float_or("period", 3600.0);
        self.amplitude = values.float_or("amplitude", 0.5);
        self.phase_shift = values.float_or("phase_shift", 0.0);
        self.base_rps = values.float("base_rps");
        Ok(())
    }

    fn validate(&self) -> bool {
        is_positive(self.period)
            && is_non_negative(self.amplitude)
            && self.amplitude <= 1.0
            && is_non_negative(self.phase_shift)
            && optional_positive(self.base_rps)
    }

    fn get_rate(&self, time_elapsed: f64, target_rps: f64) -> f64 {
        let base = self.base_rps.unwrap_or(target_rps);
        if self.period <= 0.0 {
            return clamp_rate(base);
        }
        let t = clamp_time(time_elapsed);
        let angle = 2.0 * PI * (t + self.phase_shift) / self.period;
        clamp_rate(base * (1.0 + self.amplitude * angle.sin()))
    }
}
