//! Resolver — turns a `DistributionSpec` tree into a ready strategy.
//!
//! Resolution of one node at `depth`:
//! 1. `MaxRecursionDepth` if `depth > max_depth`
//! 2. preset names expand in place (same depth); a preset already being
//!    expanded on the current chain is a `CyclicReference`
//! 3. factory lookup (`PluginNotFound`), `initialize`, `validate`
//! 4. composites: resolve each nested spec at `depth + 1`, then `attach`
//!
//! A mix nested in a mix is plain structural nesting and only the depth
//! ceiling bounds it. Everything happens once, before the run; the returned
//! instance is immutable from the dispatcher's point of view.

use serde_json::json;

use crate::config::{EngineConfig, DEFAULT_MAX_DEPTH};
use crate::distribution::{ConfigMap, Distribution, DistributionSpec};
use crate::error::DistributionError;
use crate::registry::Registry;
use crate::rng::SeedHierarchy;

/// Path label used for the root node in error messages.
pub const ROOT_PATH: &str = "root";

/// Builds resolved strategy trees from a registry.
#[derive(Debug, Clone)]
pub struct Resolver<'r> {
    registry: &'r Registry,
    max_depth: usize,
    seeds: Option<SeedHierarchy>,
}

/// Mutable state threaded through one resolution.
#[derive(Default)]
pub(crate) struct Walk {
    /// Preset names currently being expanded, outermost first.
    pub(crate) visiting: Vec<String>,
    pub(crate) nodes: usize,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
            seeds: None,
        }
    }

    pub fn with_config(registry: &'r Registry, config: &EngineConfig) -> Self {
        Self {
            registry,
            max_depth: config.max_depth,
            seeds: config.seed.map(SeedHierarchy::new),
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Derive per-node seeds from `seed` for strategies that take one.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seeds = Some(SeedHierarchy::new(seed));
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Resolve `spec` into a ready-to-run strategy.
    pub fn resolve(
        &self,
        spec: &DistributionSpec,
    ) -> Result<Box<dyn Distribution>, DistributionError> {
        let mut walk = Walk::default();
        let resolved = self.resolve_node(spec, "", 0, &mut walk)?;
        let fingerprint = spec.fingerprint();
        tracing::info!(
            distribution = %spec.name,
            fingerprint = fingerprint.short(),
            run_seed = ?self.seeds.map(|s| s.run_seed()),
            nodes = walk.nodes,
            "resolved distribution"
        );
        Ok(resolved)
    }

    fn resolve_node(
        &self,
        spec: &DistributionSpec,
        path: &str,
        depth: usize,
        walk: &mut Walk,
    ) -> Result<Box<dyn Distribution>, DistributionError> {
        if depth > self.max_depth {
            return Err(DistributionError::MaxRecursionDepth {
                depth,
                limit: self.max_depth,
                path: display_path(path).to_string(),
            });
        }

        if let Some(preset) = self.registry.preset(&spec.name) {
            let expanded = enter_preset(spec, preset, walk)?;
            let resolved = self.resolve_node(&expanded, path, depth, walk);
            walk.visiting.pop();
            return resolved;
        }

        let mut instance = self.registry.create(&spec.name)?;
        let config = self.seeded_config(instance.as_ref(), spec, path);
        instance
            .initialize(&config)
            .map_err(|e| e.at(display_path(path)))?;
        if !instance.validate() {
            return Err(rejected(&spec.name, path));
        }
        walk.nodes += 1;
        tracing::debug!(distribution = %spec.name, path = display_path(path), depth, "resolved node");

        let nested = instance.nested();
        if !nested.is_empty() {
            let children = nested
                .iter()
                .map(|child| {
                    self.resolve_node(&child.spec, &join_path(path, &child.path), depth + 1, walk)
                })
                .collect::<Result<Vec<_>, _>>()?;
            instance
                .attach(children)
                .map_err(|e| e.at(display_path(path)))?;
        }

        Ok(instance)
    }

    /// `spec.config`, plus a derived `seed` when the strategy takes one and
    /// the caller did not pin it.
    pub(crate) fn seeded_config(
        &self,
        instance: &dyn Distribution,
        spec: &DistributionSpec,
        path: &str,
    ) -> ConfigMap {
        let mut config = spec.config.clone();
        if let Some(seeds) = &self.seeds {
            if !config.contains_key("seed") && instance.metadata().declares("seed") {
                config.insert("seed".into(), json!(seeds.sub_seed(path)));
            }
        }
        config
    }

    pub(crate) fn limit(&self) -> usize {
        self.max_depth
    }
}

/// Push a preset onto the expansion chain and return its expanded spec.
///
/// Keys in the referencing config override the preset's own config.
pub(crate) fn enter_preset(
    spec: &DistributionSpec,
    preset: &DistributionSpec,
    walk: &mut Walk,
) -> Result<DistributionSpec, DistributionError> {
    if walk.visiting.iter().any(|n| n == &spec.name) {
        let mut chain = walk.visiting.clone();
        chain.push(spec.name.clone());
        return Err(DistributionError::CyclicReference { chain });
    }
    walk.visiting.push(spec.name.clone());

    let mut expanded = preset.clone();
    for (key, value) in &spec.config {
        expanded.config.insert(key.clone(), value.clone());
    }
    Ok(expanded)
}

pub(crate) fn rejected(name: &str, path: &str) -> DistributionError {
    DistributionError::Configuration {
        path: display_path(path).to_string(),
        parameter: "config".into(),
        reason: format!("rejected by '{name}' validation"),
    }
}

/// `parent.child`, or just `child` at the root.
pub(crate) fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

pub(crate) fn display_path(path: &str) -> &str {
    if path.is_empty() {
        ROOT_PATH
    } else {
        path
    }
}

/// Resolve `spec` against the process-wide registry with default settings.
pub fn resolve(spec: &DistributionSpec) -> Result<Box<dyn Distribution>, DistributionError> {
    Resolver::new(crate::registry::global()).resolve(spec)
}
