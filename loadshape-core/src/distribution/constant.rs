//! Constant rate — a steady rate for the whole run.
//!
//! Returns `rps` when configured, otherwise the caller's target.

use crate::error::DistributionError;
use crate::params::{optional_positive, ParamValues};
use crate::schema::{DistributionMetadata, ParamType, Parameter};

use super::{clamp_rate, ConfigMap, Distribution};

/// Constant rate distribution.
#[derive(Debug, Clone, Default)]
pub struct Constant {
    /// Fixed rate overriding the target, if set.
    pub rps: Option<f64>,
}

impl Constant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rps(rps: f64) -> Self {
        Self { rps: Some(rps) }
    }
}

impl Distribution for Constant {
    fn metadata(&self) -> DistributionMetadata {
        DistributionMetadata::new(
            "constant",
            "Constant rate distribution - maintains steady request rate throughout test",
        )
        .param(
            "rps",
            Parameter::optional(
                ParamType::Float,
                None,
                "Fixed requests per second (overrides target_rps if set)",
            ),
        )
    }

    fn initialize(&mut self, config: &ConfigMap) -> Result<(), DistributionError> {
        let values = ParamValues::decode(&self.metadata(), config)?;
        self.rps = values.float("rps");
        Ok(())
    }

    fn validate(&self) -> bool {
        optional_positive(self.rps)
    }

    fn get_rate(&self, _time_elapsed: f64, target_rps: f64) -> f64 {
        clamp_rate(self.rps.unwrap_or(target_rps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn init(config: serde_json::Value) -> Constant {
        let mut d = Constant::new();
        d.initialize(config.as_object().unwrap()).unwrap();
        d
    }

    #[test]
    fn returns_target_for_any_time() {
        let d = init(json!({}));
        assert!(d.validate());
        for t in [0.0, 1.0, 59.5, 3600.0] {
            assert_eq!(d.get_rate(t, 100.0), 100.0);
        }
    }

    #[test]
    fn rps_overrides_target() {
        let d = init(json!({"rps": 50}));
        assert_eq!(d.get_rate(10.0, 100.0), 50.0);
    }

    #[test]
    fn non_positive_rps_is_invalid() {
        assert!(!init(json!({"rps": 0})).validate());
        assert!(!init(json!({"rps": -5.0})).validate());
    }

    #[test]
    fn negative_target_clamps_to_zero() {
        let d = init(json!({}));
        assert_eq!(d.get_rate(0.0, -10.0), 0.0);
    }

    #[test]
    fn mistyped_rps_fails_initialize() {
        let mut d = Constant::new();
        let err = d
            .initialize(json!({"rps": "fast"}).as_object().unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("'rps'"));
    }
}
