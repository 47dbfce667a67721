//! Poisson jitter — random fluctuation around a mean rate.
//!
//! Each call draws a multiplicative factor `X = exp(σz - σ²/2)` with `z`
//! standard normal, so `X` is log-normal with `E[X] = 1` and the long-run
//! mean rate equals `mean`. `σ` is chosen so the coefficient of variation of
//! `X` is exactly `jitter`.
//!
//! The generator belongs to the instance and is seeded once at `initialize`:
//! the same seed reproduces the same sequence of draws. `unseeded = true`
//! draws the seed from OS entropy instead.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::error::DistributionError;
use crate::params::{is_non_negative, optional_positive, ParamValues};
use crate::schema::{DistributionMetadata, ParamType, Parameter};

use super::{clamp_rate, ConfigMap, Distribution};

const DEFAULT_JITTER: f64 = 0.1;

/// Poisson jitter distribution.
pub struct Poisson {
    pub jitter: f64,
    pub lambda_param: Option<f64>,
    pub seed: u64,
    pub unseeded: bool,
    /// Log-space standard deviation derived from `jitter`.
    sigma: f64,
    rng: Mutex<StdRng>,
}

impl Default for Poisson {
    fn default() -> Self {
        Self {
            jitter: DEFAULT_JITTER,
            lambda_param: None,
            seed: 0,
            unseeded: false,
            sigma: log_sigma(DEFAULT_JITTER),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }
}

impl std::fmt::Debug for Poisson {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poisson")
            .field("jitter", &self.jitter)
            .field("lambda_param", &self.lambda_param)
            .field("seed", &self.seed)
            .field("unseeded", &self.unseeded)
            .finish_non_exhaustive()
    }
}

impl Poisson {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(jitter: f64, seed: u64) -> Self {
        Self {
            jitter,
            seed,
            sigma: log_sigma(jitter),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..Self::default()
        }
    }

    /// Draw one mean-one log-normal factor.
    fn factor(&self) -> f64 {
        if self.sigma == 0.0 {
            return 1.0;
        }
        let (u1, u2) = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            // u1 in (0, 1] keeps ln() finite.
            (1.0 - rng.gen::<f64>(), rng.gen::<f64>())
        };
        // Box-Muller transform
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        (self.sigma * z - 0.5 * self.sigma * self.sigma).exp()
    }
}

/// `σ` such that a log-normal with `E[X] = 1` has standard deviation `jitter`.
///
/// Infinite once `jitter²` overflows; `validate` rejects that.
fn log_sigma(jitter: f64) -> f64 {
    if is_non_negative(jitter) {
        (jitter * jitter).ln_1p().sqrt()
    } else {
        0.0
    }
}

impl Distribution for Poisson {
    fn metadata(&self) -> DistributionMetadata {
        DistributionMetadata::new(
            "poisson",
            "Poisson distribution - random arrivals with mean-preserving jitter around target RPS",
        )
        .param(
            "jitter",
            Parameter::optional(
                ParamType::Float,
                Some(json!(DEFAULT_JITTER)),
                "Relative standard deviation of the rate (0 disables jitter)",
            ),
        )
        .param(
            "variance_scale",
            Parameter::optional(
                ParamType::Float,
                None,
                "Legacy spread control; jitter = 0.1 * variance_scale",
            ),
        )
        .param(
            "lambda_param",
            Parameter::optional(
                ParamType::Float,
                None,
                "Mean rate (uses target_rps if not set)",
            ),
        )
        .param(
            "seed",
            Parameter::optional(ParamType::Int, Some(json!(0)), "Random seed for reproducibility"),
        )
        .param(
            "unseeded",
            Parameter::optional(
                ParamType::Bool,
                Some(json!(false)),
                "Seed from OS entropy instead of `seed`",
            ),
        )
    }

    fn initialize(&mut self, config: &ConfigMap) -> Result<(), DistributionError> {
        let values = ParamValues::decode(&self.metadata(), config)?;

        self.jitter = match (values.is_set("jitter"), values.float("variance_scale")) {
            (false, Some(scale)) => DEFAULT_JITTER * scale,
            _ => values.float_or("jitter", DEFAULT_JITTER),
        };
        self.lambda_param = values.float("lambda_param");
        self.seed = match (values.uint("seed"), values.int("seed")) {
            (Some(seed), _) => seed,
            (None, Some(_)) => return Err(DistributionError::config("seed", "must be >= 0")),
            (None, None) => 0,
        };
        self.unseeded = values.bool_or("unseeded", false);
        self.sigma = log_sigma(self.jitter);

        let rng = if self.unseeded {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(self.seed)
        };
        self.rng = Mutex::new(rng);
        Ok(())
    }

    fn validate(&self) -> bool {
        is_non_negative(self.jitter)
            && log_sigma(self.jitter).is_finite()
            && optional_positive(self.lambda_param)
    }

    fn get_rate(&self, _time_elapsed: f64, target_rps: f64) -> f64 {
        let mean = clamp_rate(self.lambda_param.unwrap_or(target_rps));
        if mean == 0.0 {
            return 0.0;
        }
        clamp_rate(mean * self.factor())
    }
}
