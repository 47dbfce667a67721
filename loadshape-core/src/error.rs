//! Error taxonomy for registration and resolution.
//!
//! Every variant is fatal and surfaces before a run starts. Once a strategy
//! is resolved, `get_rate` has no failure path.

/// Errors raised while registering, configuring, or resolving distributions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DistributionError {
    #[error("Distribution '{name}' not found")]
    PluginNotFound { name: String },

    #[error("Distribution '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("Invalid configuration at {path}: parameter '{parameter}' {reason}")]
    Configuration {
        path: String,
        parameter: String,
        reason: String,
    },

    #[error("Nesting depth {depth} at {path} exceeds the limit of {limit}")]
    MaxRecursionDepth {
        depth: usize,
        limit: usize,
        path: String,
    },

    #[error("Cyclic reference: {}", .chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },
}

impl DistributionError {
    /// Shorthand for a configuration error at the root path.
    pub fn config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            path: "config".into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Re-anchor a configuration error under `path`.
    ///
    /// Strategies report errors relative to their own config; the resolver
    /// knows where that config sits in the tree.
    pub fn at(self, path: &str) -> Self {
        match self {
            Self::Configuration {
                parameter, reason, ..
            } => Self::Configuration {
                path: path.to_string(),
                parameter,
                reason,
            },
            other => other,
        }
    }
}
