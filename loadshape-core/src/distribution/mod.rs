//! Rate distributions — the strategy contract and its built-in implementations.
//!
//! A distribution maps `(elapsed seconds, target rps)` to an instantaneous
//! request rate. Primitives compute the rate directly; composites (mix,
//! sequence) delegate to child distributions that the resolver builds and
//! hands back through `attach`.
//!
//! Lifecycle of one instance, driven by the resolver:
//! 1. construct via a registry factory
//! 2. `initialize(config)` decodes parameters
//! 3. `validate()` gates the run
//! 4. composites only: `nested()` → resolve each child → `attach(children)`
//! 5. `get_rate` on every dispatch tick, possibly from many threads

pub mod constant;
pub mod linear;
pub mod mix;
pub mod poisson;
pub mod sequence;
pub mod sine;
pub mod step;

pub use constant::Constant;
pub use linear::Linear;
pub use mix::Mix;
pub use poisson::Poisson;
pub use sequence::{PostBehavior, Sequence};
pub use sine::Sine;
pub use step::Step;

pub use crate::spec::{ConfigMap, DistributionSpec};

use crate::error::DistributionError;
use crate::params::to_float;
use crate::schema::DistributionMetadata;

/// The strategy contract every distribution implements.
///
/// # Invariants
/// - `get_rate` never returns a negative value and never fails.
/// - `get_rate` takes `&self`: one resolved instance is shared by every worker
///   of a run. Implementations that keep mutable state (RNG) must synchronize it
///   internally.
/// - `get_rate` does no I/O and no unbounded allocation.
pub trait Distribution: Send + Sync {
    /// Identity and parameter schema. Callable before `initialize`.
    fn metadata(&self) -> DistributionMetadata;

    /// Decode and store the raw configuration.
    fn initialize(&mut self, config: &ConfigMap) -> Result<(), DistributionError>;

    /// Whether the stored configuration is runnable.
    fn validate(&self) -> bool;

    /// Instantaneous rate at `time_elapsed` seconds for a nominal `target_rps`.
    fn get_rate(&self, time_elapsed: f64, target_rps: f64) -> f64;

    /// Child specs to resolve, in the order `attach` expects them back.
    fn nested(&self) -> Vec<NestedSpec> {
        Vec::new()
    }

    /// Receive resolved children, one per `nested()` entry.
    fn attach(&mut self, children: Vec<Box<dyn Distribution>>) -> Result<(), DistributionError> {
        if children.is_empty() {
            Ok(())
        } else {
            Err(DistributionError::config(
                "distribution",
                "does not accept nested distributions",
            ))
        }
    }
}

/// A child spec together with its location inside the parent config.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedSpec {
    /// Relative path, e.g. `components[1].distribution`.
    pub path: String,
    pub spec: DistributionSpec,
}

/// Clamp a computed rate to the physical range. NaN becomes 0.
#[inline]
pub fn clamp_rate(rate: f64) -> f64 {
    rate.max(0.0)
}

/// Negative or NaN elapsed time is treated as the start of the run.
#[inline]
pub fn clamp_time(time_elapsed: f64) -> f64 {
    time_elapsed.max(0.0)
}

/// Read an optional `target_rps` override from a nested child's config.
///
/// Composites use this for per-component and per-stage targets.
pub(crate) fn target_override(config: &ConfigMap) -> Result<Option<f64>, DistributionError> {
    match config.get("target_rps") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(raw) => to_float(raw)
            .map(Some)
            .ok_or_else(|| DistributionError::config("target_rps", format!("expected float, got {}", raw))),
    }
}
