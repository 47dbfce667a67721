//! Linear ramp — rate grows from zero and caps at the target.
//!
//! Two ways to describe the slope:
//! - `ramp_rate`: rps gained per second, `rate = min(t * ramp_rate, target)`
//! - `ramp_duration`: seconds to reach the target, `rate = target * t / ramp_duration`
//!
//! Setting both is ambiguous and fails validation. With neither, the ramp
//! takes 60 seconds.

use serde_json::json;

use crate::error::DistributionError;
use crate::params::{optional_positive, ParamValues};
use crate::schema::{DistributionMetadata, ParamType, Parameter};

use super::{clamp_rate, clamp_time, ConfigMap, Distribution};

const DEFAULT_RAMP_DURATION: f64 = 60.0;

/// Linear ramp-up distribution.
#[derive(Debug, Clone, Default)]
pub struct Linear {
    pub ramp_rate: Option<f64>,
    pub ramp_duration: Option<f64>,
}

impl Linear {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ramp_rate(ramp_rate: f64) -> Self {
        Self {
            ramp_rate: Some(ramp_rate),
            ramp_duration: None,
        }
    }
}

impl Distribution for Linear {
    fn metadata(&self) -> DistributionMetadata {
        DistributionMetadata::new(
            "linear",
            "Linear ramp-up distribution - gradually increases from 0 to target RPS",
        )
        .param(
            "ramp_rate",
            Parameter::optional(
                ParamType::Float,
                None,
                "Requests per second gained per elapsed second",
            ),
        )
        .param(
            "ramp_duration",
            Parameter::optional(
                ParamType::Float,
                Some(json!(DEFAULT_RAMP_DURATION)),
                "Ramp duration in seconds to reach target RPS (used when ramp_rate is unset)",
            ),
        )
    }

    fn initialize(&mut self, config: &ConfigMap) -> Result<(), DistributionError> {
        let values = ParamValues::decode(&self.metadata(), config)?;
        self.ramp_rate = values.float("ramp_rate");
        self.ramp_duration = values
            .is_set("ramp_duration")
            .then(|| values.float("ramp_duration"))
            .flatten();
        Ok(())
    }

    fn validate(&self) -> bool {
        if self.ramp_rate.is_some() && self.ramp_duration.is_some() {
            return false;
        }
        optional_positive(self.ramp_rate) && optional_positive(self.ramp_duration)
    }

    fn get_rate(&self, time_elapsed: f64, target_rps: f64) -> f64 {
        let t = clamp_time(time_elapsed);
        let target = clamp_rate(target_rps);
        let rate = match self.ramp_rate {
            Some(ramp_rate) => t * ramp_rate,
            None => {
                let duration = self.ramp_duration.unwrap_or(DEFAULT_RAMP_DURATION);
                if duration <= 0.0 {
                    return target;
                }
                target * t / duration
            }
        };
        clamp_rate(rate.min(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init(config: serde_json::Value) -> Linear {
        let mut d = Linear::new();
        d.initialize(config.as_object().unwrap()).unwrap();
        d
    }

    #[test]
    fn ramp_rate_grows_then_clamps() {
        let d = init(json!({"ramp_rate": 2}));
        assert!(d.validate());
        assert_eq!(d.get_rate(0.0, 100.0), 0.0);
        assert_eq!(d.get_rate(40.0, 100.0), 80.0);
        assert_eq!(d.get_rate(60.0, 100.0), 100.0);
    }

    #[test]
    fn ramp_duration_interpolates() {
        let d = init(json!({"ramp_duration": 30}));
        assert!(d.validate());
        assert_eq!(d.get_rate(0.0, 100.0), 0.0);
        assert_eq!(d.get_rate(15.0, 100.0), 50.0);
        assert_eq!(d.get_rate(30.0, 100.0), 100.0);
        assert_eq!(d.get_rate(90.0, 100.0), 100.0);
    }

    #[test]
    fn default_ramp_takes_sixty_seconds() {
        let d = init(json!({}));
        assert!(d.validate());
        assert_eq!(d.get_rate(30.0, 100.0), 50.0);
        assert_eq!(d.get_rate(60.0, 100.0), 100.0);
    }

    #[test]
    fn both_slopes_is_invalid() {
        assert!(!init(json!({"ramp_rate": 1, "ramp_duration": 10})).validate());
    }

    #[test]
    fn non_positive_slope_is_invalid() {
        assert!(!init(json!({"ramp_rate": 0})).validate());
        assert!(!init(json!({"ramp_duration": -1})).validate());
    }

    #[test]
    fn negative_time_is_start_of_ramp() {
        let d = init(json!({"ramp_rate": 5}));
        assert_eq!(d.get_rate(-10.0, 100.0), 0.0);
    }
}
