//! Run and engine configuration.
//!
//! - `RunConfig`: what a single load-test run asks for (target rate, duration,
//!   seed, distribution spec). Loaded from TOML or JSON.
//! - `EngineConfig`: knobs of the resolver itself, with environment overrides.
//!
//! ```toml
//! target_rps = 100.0
//! duration_seconds = 600.0
//! seed = 42
//!
//! [distribution]
//! name = "sine"
//! config = { period = 120.0, amplitude = 0.3 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::spec::DistributionSpec;

/// Default nesting ceiling for composite distributions.
pub const DEFAULT_MAX_DEPTH: usize = 8;

pub const ENV_MAX_DEPTH: &str = "LOADSHAPE_MAX_DEPTH";
pub const ENV_SEED: &str = "LOADSHAPE_SEED";

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("environment variable {name}={value} is not a valid integer")]
    Env { name: &'static str, value: String },
}

// ─── Engine ──────────────────────────────────────────────────────────

/// Resolver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Run seed for deriving per-node sub-seeds.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `LOADSHAPE_MAX_DEPTH` and `LOADSHAPE_SEED`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_MAX_DEPTH) {
            config.max_depth = parse_env(ENV_MAX_DEPTH, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SEED) {
            config.seed = Some(parse_env(ENV_SEED, &raw)?);
        }
        Ok(config)
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Env {
        name,
        value: raw.to_string(),
    })
}

// ─── Run ─────────────────────────────────────────────────────────────

/// One load-test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub target_rps: f64,
    pub duration_seconds: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    pub distribution: DistributionSpec,
}

impl RunConfig {
    /// Load from a `.toml` or `.json` file, by extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks on the scalar fields. The distribution itself is
    /// checked by the resolver.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.target_rps.is_finite() || self.target_rps < 0.0 {
            return Err(ConfigError::Invalid {
                field: "target_rps",
                reason: format!("must be a finite number >= 0, got {}", self.target_rps),
            });
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "duration_seconds",
                reason: format!("must be > 0, got {}", self.duration_seconds),
            });
        }
        if self.distribution.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "distribution.name",
                reason: "must be non-empty".into(),
            });
        }
        Ok(())
    }

    /// Engine settings for this run: `base` with the run's seed, if it has one.
    pub fn engine(&self, base: EngineConfig) -> EngineConfig {
        match self.seed {
            Some(seed) => base.with_seed(Some(seed)),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TOML_RUN: &str = r#"
target_rps = 100.0
duration_seconds = 600.0
seed = 42

[distribution]
name = "sine"
config = { period = 120.0, amplitude = 0.3 }
"#;

    #[test]
    fn parses_toml_run() {
        let run = RunConfig::from_toml(TOML_RUN).unwrap();
        assert_eq!(run.target_rps, 100.0);
        assert_eq!(run.seed, Some(42));
        assert_eq!(run.distribution.name, "sine");
        assert_eq!(run.distribution.config["period"], serde_json::json!(120.0));
    }

    #[test]
    fn parses_json_run_without_config() {
        let run = RunConfig::from_json(
            r#"{"target_rps": 10, "duration_seconds": 5, "distribution": {"name": "constant"}}"#,
        )
        .unwrap();
        assert_eq!(run.seed, None);
        assert!(run.distribution.config.is_empty());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let err = RunConfig::from_json(
            r#"{"target_rps": -1, "duration_seconds": 5, "distribution": {"name": "constant"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "target_rps", .. }));

        let err = RunConfig::from_json(
            r#"{"target_rps": 1, "duration_seconds": 0, "distribution": {"name": "constant"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "duration_seconds", .. }));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            RunConfig::from_toml("target_rps = ").unwrap_err(),
            ConfigError::Toml(_)
        ));
    }

    #[test]
    fn engine_defaults_and_env_overrides() {
        let empty = EngineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(empty, EngineConfig::default());
        assert_eq!(empty.max_depth, 8);

        let vars: HashMap<&str, &str> = [(ENV_MAX_DEPTH, "3"), (ENV_SEED, " 99 ")].into();
        let config = EngineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn bad_env_value_is_reported() {
        let err = EngineConfig::from_lookup(|k| (k == ENV_MAX_DEPTH).then(|| "deep".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_DEPTH));
    }

    #[test]
    fn run_seed_flows_into_engine() {
        let run = RunConfig::from_toml(TOML_RUN).unwrap();
        let engine = run.engine(EngineConfig::default());
        assert_eq!(engine.seed, Some(42));
        assert_eq!(engine.max_depth, DEFAULT_MAX_DEPTH);
    }
}
