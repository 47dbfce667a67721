//! Registry — strategy factories and named presets, looked up by name.
//!
//! A factory builds a fresh, uninitialized strategy. Every resolution gets
//! its own instance, so run-scoped state (Poisson's generator) is never
//! shared across runs.
//!
//! Presets are saved specs stored under a name of their own. Referencing a
//! preset expands it in place during resolution; presets may reference other
//! presets, which is where cycles can appear.
//!
//! Names are kept in a `BTreeMap`, so `list_all` is in lexical order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::distribution::{
    Constant, Distribution, DistributionSpec, Linear, Mix, Poisson, Sequence, Sine, Step,
};
use crate::error::DistributionError;
use crate::schema::{validate_metadata, DistributionMetadata};

/// Builds a new, uninitialized strategy instance.
pub type Factory = Arc<dyn Fn() -> Box<dyn Distribution> + Send + Sync>;

/// Name → factory and name → preset tables.
#[derive(Clone, Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
    presets: BTreeMap<String, DistributionSpec>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("presets", &self.presets.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the seven built-in strategies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert("constant", factory(Constant::new));
        registry.insert("linear", factory(Linear::new));
        registry.insert("mix", factory(Mix::new));
        registry.insert("poisson", factory(Poisson::new));
        registry.insert("sequence", factory(Sequence::new));
        registry.insert("sine", factory(Sine::new));
        registry.insert("step", factory(Step::new));
        registry
    }

    /// Register a strategy under `name`.
    ///
    /// Fails with `DuplicateName` if the name is taken by a strategy or a
    /// preset, and with `Configuration` if the strategy's metadata is malformed.
    pub fn register<F, D>(&mut self, name: &str, make: F) -> Result<(), DistributionError>
    where
        F: Fn() -> D + Send + Sync + 'static,
        D: Distribution + 'static,
    {
        if self.contains(name) {
            return Err(DistributionError::DuplicateName {
                name: name.to_string(),
            });
        }
        let factory = factory(make);
        check_metadata(name, &factory().metadata())?;
        self.insert(name, factory);
        Ok(())
    }

    /// Register a strategy, replacing any existing strategy of the same name.
    pub fn register_or_replace<F, D>(
        &mut self,
        name: &str,
        make: F,
    ) -> Result<(), DistributionError>
    where
        F: Fn() -> D + Send + Sync + 'static,
        D: Distribution + 'static,
    {
        if self.presets.contains_key(name) {
            return Err(DistributionError::DuplicateName {
                name: name.to_string(),
            });
        }
        let factory = factory(make);
        check_metadata(name, &factory().metadata())?;
        if self.factories.contains_key(name) {
            tracing::warn!(distribution = name, "replacing registered distribution");
        }
        self.insert(name, factory);
        Ok(())
    }

    /// Store `spec` under `name` as a preset.
    pub fn register_preset(
        &mut self,
        name: &str,
        spec: DistributionSpec,
    ) -> Result<(), DistributionError> {
        if self.contains(name) {
            return Err(DistributionError::DuplicateName {
                name: name.to_string(),
            });
        }
        tracing::debug!(preset = name, expands_to = %spec.name, "registered preset");
        self.presets.insert(name.to_string(), spec);
        Ok(())
    }

    /// Factory for `name`.
    pub fn get(&self, name: &str) -> Result<Factory, DistributionError> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| DistributionError::PluginNotFound {
                name: name.to_string(),
            })
    }

    /// A fresh, uninitialized instance of `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Distribution>, DistributionError> {
        self.get(name).map(|make| make())
    }

    /// Metadata of the strategy registered as `name`.
    pub fn metadata(&self, name: &str) -> Result<DistributionMetadata, DistributionError> {
        self.create(name).map(|d| d.metadata())
    }

    pub fn preset(&self, name: &str) -> Option<&DistributionSpec> {
        self.presets.get(name)
    }

    /// Registered strategy names, lexical order.
    pub fn list_all(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Registered preset names, lexical order.
    pub fn list_presets(&self) -> Vec<String> {
        self.presets.keys().cloned().collect()
    }

    /// True if `name` is a strategy or a preset.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name) || self.presets.contains_key(name)
    }

    fn insert(&mut self, name: &str, factory: Factory) {
        self.factories.insert(name.to_string(), factory);
    }
}

fn factory<F, D>(make: F) -> Factory
where
    F: Fn() -> D + Send + Sync + 'static,
    D: Distribution + 'static,
{
    Arc::new(move || Box::new(make()) as Box<dyn Distribution>)
}

fn check_metadata(name: &str, metadata: &DistributionMetadata) -> Result<(), DistributionError> {
    let report = validate_metadata(metadata);
    if report.is_valid {
        Ok(())
    } else {
        Err(DistributionError::Configuration {
            path: name.to_string(),
            parameter: "metadata".into(),
            reason: report.errors.join("; "),
        })
    }
}

// ─── Process-wide registry ───────────────────────────────────────────

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry.
///
/// Holds the built-ins unless an application installed its own registry
/// with [`install_global`] before the first call.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::with_builtins)
}

/// Install `registry` as the process-wide registry.
///
/// Succeeds once, before anything has read [`global`]. Otherwise the
/// registry is handed back.
pub fn install_global(registry: Registry) -> Result<(), Registry> {
    GLOBAL.set(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::ConfigMap;

    struct Flat;

    impl Distribution for Flat {
        fn metadata(&self) -> DistributionMetadata {
            DistributionMetadata::new("flat", "Always 1 rps")
        }
        fn initialize(&mut self, _config: &ConfigMap) -> Result<(), DistributionError> {
            Ok(())
        }
        fn validate(&self) -> bool {
            true
        }
        fn get_rate(&self, _t: f64, _target: f64) -> f64 {
            1.0
        }
    }

    struct Nameless;

    impl Distribution for Nameless {
        fn metadata(&self) -> DistributionMetadata {
            DistributionMetadata::new("", "")
        }
        fn initialize(&mut self, _config: &ConfigMap) -> Result<(), DistributionError> {
            Ok(())
        }
        fn validate(&self) -> bool {
            true
        }
        fn get_rate(&self, _t: f64, _target: f64) -> f64 {
            0.0
        }
    }

    #[test]
    fn builtins_listed_in_lexical_order() {
        let registry = Registry::with_builtins();
        assert_eq!(
            registry.list_all(),
            vec!["constant", "linear", "mix", "poisson", "sequence", "sine", "step"]
        );
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = Registry::with_builtins();
        let err = registry.register("constant", || Flat).unwrap_err();
        assert_eq!(
            err,
            DistributionError::DuplicateName {
                name: "constant".into()
            }
        );
    }

    #[test]
    fn register_or_replace_overrides() {
        let mut registry = Registry::with_builtins();
        registry.register_or_replace("constant", || Flat).unwrap();
        let d = registry.create("constant").unwrap();
        assert_eq!(d.get_rate(0.0, 100.0), 1.0);
    }

    #[test]
    fn missing_name_is_not_found() {
        let registry = Registry::with_builtins();
        let err = registry.get("nonexistent").err().unwrap();
        assert_eq!(
            err,
            DistributionError::PluginNotFound {
                name: "nonexistent".into()
            }
        );
    }

    #[test]
    fn custom_strategy_registers() {
        let mut registry = Registry::new();
        registry.register("flat", || Flat).unwrap();
        assert!(registry.contains("flat"));
        assert_eq!(registry.metadata("flat").unwrap().name, "flat");
    }

    #[test]
    fn malformed_metadata_rejected() {
        let mut registry = Registry::new();
        let err = registry.register("nameless", || Nameless).unwrap_err();
        assert!(matches!(err, DistributionError::Configuration { .. }));
        assert!(!registry.contains("nameless"));
    }

    #[test]
    fn preset_names_share_the_namespace() {
        let mut registry = Registry::with_builtins();
        registry
            .register_preset("steady", DistributionSpec::new("constant"))
            .unwrap();
        assert!(registry.contains("steady"));
        assert_eq!(registry.list_presets(), vec!["steady"]);
        assert!(registry.register("steady", || Flat).is_err());
        assert!(registry
            .register_preset("sine", DistributionSpec::new("constant"))
            .is_err());
    }

    #[test]
    fn global_has_builtins() {
        assert!(global().contains("poisson"));
    }

    #[test]
    fn every_builtin_passes_schema_check() {
        let registry = Registry::with_builtins();
        for name in registry.list_all() {
            let metadata = registry.metadata(&name).unwrap();
            assert_eq!(metadata.name, name);
            assert!(validate_metadata(&metadata).is_valid, "{name}");
        }
    }
}
