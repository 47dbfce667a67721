//! Whole-tree validation report.
//!
//! `Resolver::resolve` stops at the first problem. `validate_spec` walks the
//! same tree with the same rules but keeps going, so a caller editing a
//! large composite sees every problem at once:
//!
//! ```text
//! components[1].distribution.name 'bogus' not found
//! components[2].distribution.config.period expected float, got "x"
//! ```

use serde::Serialize;

use crate::distribution::DistributionSpec;
use crate::error::DistributionError;
use crate::resolver::{display_path, enter_preset, join_path, Resolver, Walk};

/// Outcome of validating a spec tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Validate `spec` against the resolver's registry and limits, collecting
/// every error instead of stopping at the first.
pub fn validate_spec(resolver: &Resolver<'_>, spec: &DistributionSpec) -> ValidationReport {
    let mut errors = Vec::new();
    let mut walk = Walk::default();
    check_node(resolver, spec, "", 0, &mut walk, &mut errors);
    tracing::debug!(distribution = %spec.name, errors = errors.len(), "validated spec");
    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

fn check_node(
    resolver: &Resolver<'_>,
    spec: &DistributionSpec,
    path: &str,
    depth: usize,
    walk: &mut Walk,
    errors: &mut Vec<String>,
) {
    if depth > resolver.limit() {
        errors.push(
            DistributionError::MaxRecursionDepth {
                depth,
                limit: resolver.limit(),
                path: display_path(path).to_string(),
            }
            .to_string(),
        );
        return;
    }

    let registry = resolver.registry();
    if let Some(preset) = registry.preset(&spec.name) {
        match enter_preset(spec, preset, walk) {
            Ok(expanded) => {
                check_node(resolver, &expanded, path, depth, walk, errors);
                walk.visiting.pop();
            }
            Err(e) => errors.push(format!("{}: {e}", display_path(path))),
        }
        return;
    }

    let mut instance = match registry.create(&spec.name) {
        Ok(instance) => instance,
        Err(_) => {
            errors.push(format!("{}name '{}' not found", prefix(path), spec.name));
            return;
        }
    };

    let config = resolver.seeded_config(instance.as_ref(), spec, path);
    if let Err(e) = instance.initialize(&config) {
        match e {
            DistributionError::Configuration {
                parameter, reason, ..
            } => errors.push(format!("{}config.{parameter} {reason}", prefix(path))),
            other => errors.push(format!("{}: {other}", display_path(path))),
        }
        return;
    }
    if !instance.validate() {
        errors.push(format!(
            "{}: rejected by '{}' validation",
            display_path(path),
            spec.name
        ));
    }

    for child in instance.nested() {
        check_node(
            resolver,
            &child.spec,
            &join_path(path, &child.path),
            depth + 1,
            walk,
            errors,
        );
    }
}

fn prefix(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{path}.")
    }
}
