//! Loadshape Core — rate distribution engine for load generation.
//!
//! Computes, at any instant of a load test, the request rate a dispatcher
//! should honor:
//! - Strategy contract (`Distribution`) with a typed parameter schema
//! - Primitive strategies: constant, linear, step, sine, poisson
//! - Composite strategies: mix (weighted blend) and sequence (staged timeline)
//! - Registry of strategies and presets, resolved by name with depth and
//!   cycle guards
//! - Run configuration, whole-tree validation, rate curve preview

pub mod config;
pub mod curve;
pub mod distribution;
pub mod error;
pub mod params;
pub mod registry;
pub mod resolver;
pub mod rng;
pub mod schema;
pub mod spec;
pub mod validation;

pub use config::{ConfigError, EngineConfig, RunConfig};
pub use distribution::{Distribution, DistributionSpec};
pub use error::DistributionError;
pub use registry::Registry;
pub use resolver::Resolver;
