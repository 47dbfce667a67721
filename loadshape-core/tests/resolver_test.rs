//! Resolution guards: depth ceiling, preset cycles, registry errors,
//! engine configuration, and run configs loaded from disk.

use std::io::Write;

use loadshape_core::config::{EngineConfig, RunConfig};
use loadshape_core::validation::validate_spec;
use loadshape_core::{registry, DistributionError, DistributionSpec, Registry, Resolver};
use serde_json::json;

fn nested_mix(levels: usize) -> DistributionSpec {
    let mut value = json!({"name": "constant"});
    for _ in 0..levels {
        value = json!({"name": "mix", "config": {"components": [
            {"weight": 1, "distribution": value}
        ]}});
    }
    serde_json::from_value(value).unwrap()
}

#[test]
fn mix_in_mix_beyond_ceiling_fails_cleanly() {
    let registry = Registry::with_builtins();
    let err = Resolver::new(&registry)
        .resolve(&nested_mix(50))
        .err()
        .unwrap();
    match err {
        DistributionError::MaxRecursionDepth { depth, limit, path } => {
            assert_eq!(depth, 9);
            assert_eq!(limit, 8);
            assert!(path.starts_with("components[0].distribution"));
        }
        other => panic!("expected MaxRecursionDepth, got {other:?}"),
    }
}

#[test]
fn nesting_at_the_ceiling_resolves() {
    let registry = Registry::with_builtins();
    // 8 mixes: the innermost constant sits at depth 8
    let d = Resolver::new(&registry).resolve(&nested_mix(8)).unwrap();
    assert_eq!(d.get_rate(0.0, 42.0), 42.0);
    assert!(Resolver::new(&registry).resolve(&nested_mix(9)).is_err());
}

#[test]
fn engine_config_sets_ceiling() {
    let registry = Registry::with_builtins();
    let config = EngineConfig {
        max_depth: 2,
        seed: None,
    };
    let resolver = Resolver::with_config(&registry, &config);
    assert!(resolver.resolve(&nested_mix(2)).is_ok());
    assert!(matches!(
        resolver.resolve(&nested_mix(3)).err().unwrap(),
        DistributionError::MaxRecursionDepth { limit: 2, .. }
    ));
}

#[test]
fn self_referencing_preset_is_a_cycle() {
    let mut registry = Registry::with_builtins();
    let looping: DistributionSpec = serde_json::from_value(json!({"name": "sequence", "config": {
        "stages": [
            {"duration_seconds": 5, "distribution": {"name": "constant"}},
            {"duration_seconds": 5, "distribution": {"name": "looping"}}
        ]
    }}))
    .unwrap();
    registry.register_preset("looping", looping).unwrap();

    let err = Resolver::new(&registry)
        .resolve(&DistributionSpec::new("looping"))
        .err()
        .unwrap();
    assert_eq!(
        err,
        DistributionError::CyclicReference {
            chain: vec!["looping".into(), "looping".into()]
        }
    );
    assert_eq!(err.to_string(), "Cyclic reference: looping -> looping");
}

#[test]
fn registry_errors() {
    let mut registry = Registry::with_builtins();
    assert!(matches!(
        registry.register("sine", loadshape_core::distribution::Sine::new),
        Err(DistributionError::DuplicateName { .. })
    ));
    assert!(matches!(
        registry.get("nonexistent"),
        Err(DistributionError::PluginNotFound { .. })
    ));
}

#[test]
fn global_registry_resolves_builtins() {
    let d = loadshape_core::resolver::resolve(&DistributionSpec::new("sine").with("base_rps", 10))
        .unwrap();
    assert!((d.get_rate(0.0, 999.0) - 10.0).abs() < 1e-9);
    assert_eq!(registry::global().list_all().len(), 7);
}

#[test]
fn validation_report_lists_nested_problems() {
    let registry = Registry::with_builtins();
    let spec: DistributionSpec = serde_json::from_value(json!({"name": "sequence", "config": {
        "stages": [
            {"duration_seconds": 10, "distribution": {"name": "mix", "config": {"components": [
                {"weight": 1, "distribution": {"name": "ghost"}}
            ]}}},
            {"duration_seconds": 10, "distribution": {"name": "sine", "config": {"amplitude": 3}}}
        ]
    }}))
    .unwrap();
    let report = validate_spec(&Resolver::new(&registry), &spec);
    assert_eq!(
        report.errors,
        vec![
            "stages[0].distribution.components[0].distribution.name 'ghost' not found".to_string(),
            "stages[1].distribution: rejected by 'sine' validation".to_string(),
        ]
    );
}

#[test]
fn run_config_from_toml_file_resolves() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
target_rps = 200.0
duration_seconds = 120.0
seed = 7

[distribution]
name = "sequence"

[distribution.config]
post_behavior = "zero"
stages = [
    {{ duration_seconds = 60.0, distribution = {{ name = "linear", config = {{ ramp_duration = 60.0 }} }} }},
    {{ duration_seconds = 60.0, distribution = {{ name = "poisson", config = {{ jitter = 0.2 }} }} }},
]
"#
    )
    .unwrap();

    let run = RunConfig::from_file(file.path()).unwrap();
    assert_eq!(run.seed, Some(7));

    let registry = Registry::with_builtins();
    let engine = run.engine(EngineConfig::default());
    let d = Resolver::with_config(&registry, &engine)
        .resolve(&run.distribution)
        .unwrap();
    assert_eq!(d.get_rate(30.0, run.target_rps), 100.0);
    assert_eq!(d.get_rate(130.0, run.target_rps), 0.0);
}

#[test]
fn run_config_from_json_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{"target_rps": 50, "duration_seconds": 10, "distribution": {{"name": "constant"}}}}"#
    )
    .unwrap();
    let run = RunConfig::from_file(file.path()).unwrap();
    assert_eq!(run.target_rps, 50.0);
}

#[test]
fn unsupported_extension_rejected() {
    let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    let err = RunConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("yaml"));
}
